use std::process;

fn main() {
    process::exit(slap::cli::run());
}
