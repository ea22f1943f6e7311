/**
    Developer-facing log sink for the front-end components.

    End users never see these messages.
*/
pub trait DevConsole: Send + Sync {
    fn log(&self, message: &str);

    fn error(&self, message: &str);
}

/// Console backed by the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConsole;

impl DevConsole for LogConsole {
    fn log(&self, message: &str) {
        log::info!(target: "vidfront", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "vidfront", "{message}");
    }
}
