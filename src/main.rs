#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), eframe::Error> {
    // Set up logging; RUST_LOG=debug shows layout details
    env_logger::init();

    // Lookups and save dialogs are spawned onto this runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    let _guard = runtime.enter();

    word_tree::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
