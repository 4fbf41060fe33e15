fn main() -> anyhow::Result<()> {
    porycon::cli::run_cli()
}
