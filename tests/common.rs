//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use fx_engine::{LifecycleHooks, ModuleDescriptor};

/// Records events from hooks and factories in the order they happen
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// A sync `Fn()` hook that records `event`
    pub fn hook(&self, event: &'static str) -> impl Fn() -> anyhow::Result<()> + Send + Sync {
        let log = self.clone();
        move || {
            log.record(event);
            Ok(())
        }
    }
}

/// Logging sink handed out by the `logger` module
#[derive(Default)]
pub struct RecordingLogger {
    pub prefix: String,
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn log(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

/// config -> logger -> service, the service logging "ran" when invoked
///
/// Returned in declaration order `[service, logger, config]` so resolution
/// has to reorder them.
pub fn config_logger_service() -> Vec<ModuleDescriptor> {
    let config = ModuleDescriptor::builder("config")
        .provide("debug", |_| Ok(true))
        .build();

    let logger = ModuleDescriptor::builder("logger")
        .depends_on(&config)
        .provide("logger", |deps| {
            let debug = *deps.get::<bool>("config", "debug")?;
            Ok(RecordingLogger::new(if debug { "debug" } else { "info" }))
        })
        .build();

    let service = ModuleDescriptor::builder("service")
        .depends_on(&logger)
        .provide("run", |deps| {
            let logger = deps.get_arc::<RecordingLogger>("logger", "logger")?;
            Ok(Arc::new(move || logger.log("ran")) as Arc<dyn Fn() + Send + Sync>)
        })
        .invoke(|view| {
            let run = view.get::<Arc<dyn Fn() + Send + Sync>>("run")?;
            run();
            Ok(())
        })
        .build();

    vec![service, logger, config]
}

/// `logger.log` capability
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;
/// `service.run` capability
pub type RunFn = Arc<dyn Fn() + Send + Sync>;

/// config -> logger -> service, where `logger.log` only records when
/// `config.debug` is set and `service.run` logs "ran"
///
/// Nothing runs during resolution; the consumer calls `service.run`.
pub fn debug_gated_service(debug: bool, log: &EventLog) -> Vec<ModuleDescriptor> {
    let config = ModuleDescriptor::builder("config")
        .provide("debug", move |_| Ok(debug))
        .build();

    let sink = log.clone();
    let logger = ModuleDescriptor::builder("logger")
        .depends_on(&config)
        .provide("log", move |deps| {
            let enabled = *deps.get::<bool>("config", "debug")?;
            let sink = sink.clone();
            Ok(Arc::new(move |message: &str| {
                if enabled {
                    sink.record(message);
                }
            }) as LogFn)
        })
        .build();

    let service = ModuleDescriptor::builder("service")
        .depends_on(&logger)
        .provide("run", |deps| {
            let log = deps.get_arc::<LogFn>("logger", "log")?;
            Ok(Arc::new(move || (**log)("ran")) as RunFn)
        })
        .build();

    vec![config, logger, service]
}

/// Start hooks f1, f2 and stop hooks g1, g2 recording into `log`
pub fn recorded_hooks(log: &EventLog) -> LifecycleHooks {
    LifecycleHooks::new()
        .on_start(log.hook("f1"))
        .on_start(log.hook("f2"))
        .on_stop(log.hook("g1"))
        .on_stop(log.hook("g2"))
}
