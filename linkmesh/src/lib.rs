pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    AnalyzeArgs, AnalyzeOutcome, ConfigOverrides, expand_path, load_config, run_analyze,
    write_default_config,
};
