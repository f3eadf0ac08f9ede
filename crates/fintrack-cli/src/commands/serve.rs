//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::Result;

use fintrack_core::config::AppConfig;

use super::open_db;

/// Apply command-line overrides on top of the loaded config
pub fn apply_serve_overrides(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> AppConfig {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if static_dir.is_some() {
        config.server.static_dir = static_dir;
    }
    config
}

pub async fn cmd_serve(
    db_path: &Path,
    no_encrypt: bool,
    config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> Result<()> {
    let config = apply_serve_overrides(config, host, port, static_dir);

    println!("🚀 Starting fintrack web server...");
    println!("   Database: {}", db_path.display());
    println!(
        "   Listening: http://{}:{}",
        config.server.host, config.server.port
    );
    if let Some(dir) = &config.server.static_dir {
        println!("   Static files: {}", dir.display());
    }
    if config.auth.jwt_secret.is_none() {
        println!("   ⚠️  No JWT secret configured (FINTRACK_JWT_SECRET); sessions end on restart");
    }
    if config.scheduler.reminder_interval_minutes == 0 {
        println!("   Payment reminders: disabled");
    } else {
        println!(
            "   Payment reminders: every {} min",
            config.scheduler.reminder_interval_minutes
        );
    }
    if config.scheduler.snapshot_interval_hours == 0 {
        println!("   Budget snapshots: disabled");
    } else {
        println!(
            "   Budget snapshots: every {} h",
            config.scheduler.snapshot_interval_hours
        );
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;
    fintrack_server::serve_with_config(db, config).await?;

    Ok(())
}
