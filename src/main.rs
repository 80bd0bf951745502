fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(family_tree_renderer::cli::log_filter())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = family_tree_renderer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
