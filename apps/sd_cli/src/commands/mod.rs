// apps/sd_cli/src/commands/mod.rs

//! 子命令

pub mod export;
pub mod info;
pub mod project;
pub mod verify;

use std::path::Path;

use sd_config::DotConfig;
use sd_foundation::SdResult;
use sd_projection::DesignVariable;
use sd_sensitivity::{SensitivityFileReader, SensitivityStore};
use tracing::info;

/// 一次运行的输入：配置、灵敏度存储与设计变量
pub struct Session {
    pub config: DotConfig,
    pub store: SensitivityStore,
    pub variables: Vec<DesignVariable>,
}

impl Session {
    /// 读取配置与灵敏度记录，构造设计变量
    ///
    /// 各层错误在这里汇聚为 `SdError`。
    pub fn load(config_path: &Path) -> SdResult<Self> {
        let config = DotConfig::from_file(config_path)?;
        info!("灵敏度记录: {}", config.sensitivity_file.display());
        let store = SensitivityFileReader::read_file(&config.sensitivity_file)?;
        let variables = DesignVariable::from_specs(&config.design_variables, &store)?;

        info!(
            "{} 个分区, {} 个表面节点, {} 个设计变量",
            store.n_zones(),
            store.total_surface_nodes(),
            variables.len()
        );
        Ok(Self {
            config,
            store,
            variables,
        })
    }
}
