use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy stdin to stdout while logging the transfer rate
    Pipe(Pipe),
}

#[derive(Parser, Clone, Debug)]
pub struct Pipe {
    /// Clock ticks per second (defaults to $SPEEDGAUGE_RESOLUTION, then 4)
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Milliseconds between rate reports
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Copy buffer size in bytes
    #[arg(long, default_value_t = 8192)]
    pub buffer: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_defaults() {
        let cli = Cli::try_parse_from(["speedgauge", "pipe"]).unwrap();
        match cli.command {
            Some(Commands::Pipe(p)) => {
                assert_eq!(p.resolution, None);
                assert_eq!(p.interval_ms, 1000);
                assert_eq!(p.buffer, 8192);
            }
            None => panic!("expected pipe"),
        }
    }

    #[test]
    fn pipe_overrides() {
        let cli = Cli::try_parse_from([
            "speedgauge",
            "pipe",
            "--resolution",
            "10",
            "--interval-ms",
            "250",
        ])
        .unwrap();
        let Some(Commands::Pipe(p)) = cli.command else {
            panic!("expected pipe");
        };
        assert_eq!(p.resolution, Some(10));
        assert_eq!(p.interval_ms, 250);
    }
}
