fn main() {
    std::process::exit(starnight_cli::run());
}
