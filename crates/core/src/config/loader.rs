use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use super::models::SchedulingConfig;

impl SchedulingConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序：
    /// 1. 内置默认值
    /// 2. TOML配置文件
    /// 3. 环境变量覆盖（前缀: WAREHOUSE_，层级分隔符: __）
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径；为None时按默认路径查找，找不到则仅用默认值
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults =
            ConfigBuilder::try_from(&SchedulingConfig::default()).context("构建默认配置失败")?;
        let mut builder = ConfigBuilder::builder().add_source(defaults);

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else {
            let default_paths = [
                "config/warehouse.toml",
                "warehouse.toml",
                "/etc/warehouse-scheduler/config.toml",
            ];
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("WAREHOUSE")
                .separator("__")
                .try_parsing(true),
        );

        let config: SchedulingConfig = builder
            .build()
            .context("合并配置源失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate().context("配置校验失败")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = SchedulingConfig::load(None).unwrap();
        assert_eq!(config.assignment.max_tasks_per_worker, 10);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = SchedulingConfig::load(Some("/nonexistent/warehouse.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[priority]
urgency = 0.5
customer_tier = 0.2
deadline = 0.15
resource = 0.1
business_impact = 0.05

[assignment]
max_tasks_per_worker = 6
"#
        )
        .unwrap();

        let config = SchedulingConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert!((config.priority.urgency - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.assignment.max_tasks_per_worker, 6);
        // 文件中未出现的部分保留默认值
        assert!((config.assignment.axes.skill - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[assignment]
max_tasks_per_worker = 0
"#
        )
        .unwrap();

        let result = SchedulingConfig::load(Some(file.path().to_str().unwrap()));
        assert!(result.is_err());
    }
}
