/// CLI module - command-line interface for treesync
mod cli;

fn main() {
    cli::run_cli();
}
