use json_match_format::Mismatch;

/// Where assertion failures go.
///
/// The assertion functions call [`Reporter::fail`] once per mismatch and
/// then return whether the comparison passed. Authoring errors in rule
/// declarations are reported once, with no comparison performed.
pub trait Reporter {
    fn fail(&mut self, message: &str, mismatch: Option<&Mismatch>);
}

/// Panics on the first failure. Suitable inside `#[test]` functions.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn fail(&mut self, message: &str, _mismatch: Option<&Mismatch>) {
        panic!("{message}");
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    pub message: String,
    pub mismatch: Option<Mismatch>,
}

/// Records every failure for later inspection.
#[derive(Clone, Debug, Default)]
pub struct CollectingReporter {
    failures: Vec<Failure>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.message.as_str())
    }

    pub fn into_mismatches(self) -> Vec<Mismatch> {
        self.failures
            .into_iter()
            .filter_map(|failure| failure.mismatch)
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn fail(&mut self, message: &str, mismatch: Option<&Mismatch>) {
        self.failures.push(Failure {
            message: message.to_string(),
            mismatch: mismatch.cloned(),
        });
    }
}
