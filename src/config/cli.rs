use crate::config::client_config::ClientConfig;
use crate::domain::model::{Id, PageRequest};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "autocare")]
#[command(about = "Command-line client for the AutoCare service-center admin API")]
pub struct CliConfig {
    #[arg(long, short, help = "Path to a TOML client configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Override api.base_url")]
    pub base_url: Option<String>,

    #[arg(long, help = "Bearer token used for every request")]
    pub token: Option<String>,

    #[arg(long, default_value = "0", global = true)]
    pub page: u32,

    #[arg(long, default_value = "10", global = true)]
    pub size: u32,

    #[arg(long, global = true)]
    pub search: Option<String>,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 檢查後端健康狀態
    Health,
    /// 登入並印出 token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Centers {
        #[command(subcommand)]
        action: ResourceAction,
    },
    Parts {
        #[command(subcommand)]
        action: ResourceAction,
    },
    Promotions {
        #[command(subcommand)]
        action: ResourceAction,
    },
    Users {
        #[command(subcommand)]
        action: ResourceAction,
    },
    Customers {
        #[command(subcommand)]
        action: ResourceAction,
    },
    Vehicles {
        #[command(subcommand)]
        action: ResourceAction,
    },
    Staff {
        #[command(subcommand)]
        action: ResourceAction,
    },
    Bookings {
        #[command(subcommand)]
        action: BookingAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ResourceAction {
    List,
    Get { id: Id },
    Delete { id: Id },
}

#[derive(Debug, Clone, Subcommand)]
pub enum BookingAction {
    List,
    Get {
        id: Id,
    },
    Cancel {
        id: Id,
        #[arg(long)]
        reason: Option<String>,
    },
    /// 查詢某中心某日的可用時段
    Slots {
        #[arg(long)]
        center_id: Id,
        #[arg(long)]
        date: NaiveDate,
    },
}

impl CliConfig {
    /// 設定檔 → 環境變數 → 命令列參數，後者覆寫前者
    pub fn load_client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        config.apply_env_overrides();

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            config.auth.token = Some(token.clone());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn page_request(&self) -> PageRequest {
        let request = PageRequest::new(self.page, self.size);
        match &self.search {
            Some(keyword) => request.search(keyword.clone()),
            None => request,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validation::validate_url("--base-url", base_url)?;
        }
        validation::validate_range("--size", self.size, 1, 200)?;
        Ok(())
    }
}
