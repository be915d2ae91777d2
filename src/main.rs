//! imptest CLI entry point

fn main() {
    imptest::cli::run();
}
