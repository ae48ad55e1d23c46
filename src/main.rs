fn main() {
    fmtspec::cli::run();
}
