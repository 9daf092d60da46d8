fn main() -> anyhow::Result<()> {
    xia::cli::run_cli()
}
