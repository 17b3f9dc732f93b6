use serde::Serialize;

/// Gravedad de un aviso para el usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Aviso no fatal producido por una operación (fallbacks, sesión invalidada...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info<S: Into<String>>(message: S) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Resultado de una operación junto con los avisos que la acompañan
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl<T> Outcome<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            notices: Vec::new(),
        }
    }

    pub fn with_notices(data: T, notices: Vec<Notice>) -> Self {
        Self { data, notices }
    }

    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn has_warnings(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Warning)
    }
}
