use crate::app::App;
use crate::config::{render_document, DocumentFormat};
use crate::platform::Systemctl;
use crate::subscription::{FetchOptions, SubscriptionSource, DEFAULT_USER_AGENT};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

mod app;
mod config;
mod external;
mod platform;
mod subscription;

#[derive(Debug, Parser)]
#[command(
    name = "v2sync",
    about = "Rebuild v2ray outbounds from a subscription and restart the daemon"
)]
struct ProgramArgs {
    /// Subscription URL (http, https or file)
    #[arg(long)]
    pub url: String,
    /// Path of the generated config; overwritten on success
    #[arg(long)]
    pub config_path: PathBuf,
    /// Path of the config template carrying one vmess and one shadowsocks outbound
    #[arg(long)]
    pub config_template_path: PathBuf,
    /// Systemd unit restarted after the config is written
    #[arg(long, default_value = "v2ray")]
    pub service: String,
    /// Write the config without restarting the service
    #[arg(long)]
    pub no_reload: bool,
    /// Print the merged config to stdout; nothing is written or restarted
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
    /// Subscription request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Route the subscription request through HTTP_PROXY/HTTPS_PROXY
    #[arg(long)]
    pub use_env_proxy: bool,
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn main() -> ExitCode {
    let args: ProgramArgs = ProgramArgs::parse();
    if let Err(e) = external::init_tracing(&args.log_level) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let source = match SubscriptionSource::parse(&args.url) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let fetch_options = FetchOptions {
        user_agent: args.user_agent,
        timeout: args.timeout.map(Duration::from_secs),
        use_env_proxy: args.use_env_proxy,
    };
    let app = App::new(
        source,
        fetch_options,
        args.config_template_path,
        args.config_path.clone(),
        (!args.no_reload).then_some(args.service),
        Systemctl,
    );

    if args.dry_run {
        return match rt.block_on(dry_run(&app, &args.config_path)) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{:#}", e);
                ExitCode::FAILURE
            }
        };
    }
    match rt.block_on(app.run()) {
        Ok(merged) => {
            tracing::info!(
                "Updated {} with {} servers ({} lines skipped)",
                args.config_path.to_string_lossy(),
                merged.servers,
                merged.rejected
            );
            ExitCode::SUCCESS
        }
        Err(e) if e.config_written() => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dry_run(app: &App<Systemctl>, config_path: &Path) -> anyhow::Result<()> {
    let merged = app.prepare().await?;
    let rendered = render_document(&merged.document, DocumentFormat::from_path(config_path))?;
    std::io::stdout().write_all(&rendered)?;
    Ok(())
}
