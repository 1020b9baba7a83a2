use std::sync::Once;

use log::LevelFilter;

/// Crates whose info output drowns the renderer's own messages.
const GPU_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger settings for hosts of the debug renderer.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter string, e.g. "phys2d_render=debug". Takes
    /// precedence over `RUST_LOG`.
    pub filter: Option<String>,

    /// Level used when neither `filter` nor `RUST_LOG` is set.
    pub level: LevelFilter,

    /// Caps the GPU stack at warn when no filter string applies.
    pub quiet_gpu: bool,

    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            level: LevelFilter::Info,
            quiet_gpu: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    fn builder(self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.write_style(self.write_style);

        match self.filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(self.level);
                if self.quiet_gpu {
                    for module in GPU_MODULES {
                        builder.filter_module(module, self.level.min(LevelFilter::Warn));
                    }
                }
            }
        }
        builder
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has an effect, and a
/// logger installed by the host beforehand is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        if config.builder().try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}
