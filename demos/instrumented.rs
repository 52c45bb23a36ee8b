//! A test binary which can relaunch itself under an instrumentation tool.
//!
//! Run with `--yiqi_tool <name>`. Set `YIQI_LOG` (e.g. `debug`) for logs.

use std::env;

use tracing::subscriber::set_global_default;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::FmtSubscriber;
use yiqi::IterationHooks;


fn main() -> anyhow::Result<()> {
    let level = match env::var("YIQI_LOG").as_deref() {
        Ok("error") => LevelFilter::ERROR,
        Ok("info") => LevelFilter::INFO,
        Ok("debug") => LevelFilter::DEBUG,
        Ok("trace") => LevelFilter::TRACE,
        _ => LevelFilter::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    set_global_default(subscriber)?;

    let argv: Vec<_> = env::args_os().collect();
    let mut hooks = IterationHooks::new();

    // Returns only if no relaunch was needed, or it failed.
    yiqi::init(&mut hooks, &argv)?;

    hooks.iteration_start();
    println!("RUNNING TESTS");
    let status = hooks.iteration_end();

    if let Some(status) = status {
        for (key, value) in &status.results {
            println!("RESULT: {} = {:?}", key, value);
        }
    }

    Ok(())
}
