use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_tracing(default_level: Option<LevelFilter>) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.unwrap_or(LevelFilter::WARN).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
