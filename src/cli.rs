use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "vod-dashboard")]
#[command(about = "Serve VOD pipeline inputs, job outputs and progress as JSON over HTTP")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(short, long, env = "VOD_DASHBOARD_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    /// Pipeline configuration file shared with the processing pipeline
    #[arg(short, long, env = "VOD_DASHBOARD_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["vod-dashboard"]).unwrap();
        assert_eq!(cli.addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_explicit_flags() {
        let cli = Cli::try_parse_from([
            "vod-dashboard",
            "--addr",
            "0.0.0.0:8080",
            "--config-file",
            "/etc/vod/config.json",
        ])
        .unwrap();
        assert_eq!(cli.addr.port(), 8080);
        assert_eq!(cli.config_file, Some(PathBuf::from("/etc/vod/config.json")));
    }

    #[test]
    fn test_bad_addr_is_rejected() {
        assert!(Cli::try_parse_from(["vod-dashboard", "--addr", "not-an-addr"]).is_err());
    }
}
