//! SolarQuant CLI entry point.

fn main() -> anyhow::Result<()> {
    solarquant_runner::run()
}
