#[tokio::main]
async fn main() {
  // Minimal CLI: support --version/-V
  let mut args = std::env::args().skip(1);
  if let Some(arg) = args.next() {
    if arg == "--version" || arg == "-V" {
      println!("driftmail {}", env!("CARGO_PKG_VERSION"));
      return;
    }
    if arg == "--help" || arg == "-h" {
      eprintln!("Usage: driftmail [--version]");
      return;
    }
  }

  if let Err(e) = driftmail::app::run().await {
    eprintln!("error: {e}");
    std::process::exit(1);
  }
}
