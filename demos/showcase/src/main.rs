use marquee::showcase;

fn main() {
    // `--config=<file>` picks a manifest under assets/, defaulting to the
    // built-in scene description.
    let manifest = std::env::args()
        .find_map(|arg| arg.strip_prefix("--config=").map(str::to_string))
        .unwrap_or_else(|| "showcase.ron".to_string());

    if let Err(e) = showcase::run_showcase(&manifest) {
        eprintln!("showcase failed: {e}");
        std::process::exit(1);
    }
}
