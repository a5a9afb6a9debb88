#![allow(clippy::print_stderr)]

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = exit_panel_cli::run().await {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
