use crate::model::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label}: {}", self.message)
    }
}

pub fn warning(message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        severity: Severity::Warning,
        message: message.into(),
    }
}

pub fn error(message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        message: message.into(),
    }
}

/// A converted value together with the nodes hoisted out of it and the
/// diagnostics gathered while producing it.
///
/// `extra` carries nodes that belong beside the value rather than inside
/// it (images decoded from a `w:pict` deep inside a run, for instance);
/// the nearest container that calls [`insert_extra`](Outcome::insert_extra)
/// folds them back in as siblings.
#[derive(Clone, Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub extra: Vec<Node>,
    pub messages: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            extra: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_messages(value: T, messages: Vec<Diagnostic>) -> Self {
        Self {
            value,
            extra: Vec::new(),
            messages,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            extra: self.extra,
            messages: self.messages,
        }
    }

    pub fn flat_map<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        let mut next = f(self.value);
        let mut extra = self.extra;
        extra.append(&mut next.extra);
        let mut messages = self.messages;
        messages.append(&mut next.messages);
        Outcome {
            value: next.value,
            extra,
            messages,
        }
    }

    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.messages)
    }
}

impl<T> Outcome<Vec<T>> {
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn empty_with_messages(messages: Vec<Diagnostic>) -> Self {
        Self::with_messages(Vec::new(), messages)
    }

    /// Concatenate values, extras and messages, preserving input order.
    pub fn combine(results: impl IntoIterator<Item = Outcome<Vec<T>>>) -> Self {
        let mut combined = Self::empty();
        for mut result in results {
            combined.value.append(&mut result.value);
            combined.extra.append(&mut result.extra);
            combined.messages.append(&mut result.messages);
        }
        combined
    }
}

impl Outcome<Vec<Node>> {
    pub fn element(node: Node) -> Self {
        Self::new(vec![node])
    }

    /// Move the value into the `extra` channel, leaving an empty value.
    pub fn to_extra(self) -> Self {
        let mut extra = self.extra;
        extra.extend(self.value);
        Outcome {
            value: Vec::new(),
            extra,
            messages: self.messages,
        }
    }

    /// Append pending extra nodes to the value.
    pub fn insert_extra(self) -> Self {
        if self.extra.is_empty() {
            return self;
        }
        let mut value = self.value;
        value.extend(self.extra);
        Outcome {
            value,
            extra: Vec::new(),
            messages: self.messages,
        }
    }
}
