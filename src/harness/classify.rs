//! Scenario classification
//!
//! One scenario runs as compile → execute → parse → compare, and every way that can end maps to
//! exactly one [`Outcome`]. Each scenario gets its own [`TestSubject`] and a freshly compiled
//! artifact; the artifact is deleted before the outcome is handed back.

use std::path::Path;

use super::error::{CompileError, ExecError};
use super::output::parse_output;
use super::toolchain::{Artifact, Compile, Execute, encode_input};
use crate::meta::{MetaError, Scenario, TestCase};

/// Result of one scenario (or of a whole file when its metadata is unusable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// Clean compile and run, but the result tokens differ
    Failed { expected: Vec<String>, actual: Vec<String> },
    /// The compiler flagged a syntax error; carries its diagnostic line
    CompilationFailed(String),
    /// The compiler could not be run or its output could not be used
    CompilationError(CompileError),
    ExecutionError(ExecError),
    MissingMetadata,
    MalformedMetadata { inputs: usize, outputs: usize },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Heading printed above the failure block.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "Passed",
            Outcome::Failed { .. } => "Test failed:",
            Outcome::CompilationFailed(_) => "Unexpected compilation failure:",
            Outcome::CompilationError(_) => "Unexpected compilation exception:",
            Outcome::ExecutionError(_) => "Unexpected interpreter exception:",
            Outcome::MissingMetadata => "No meta for",
            Outcome::MalformedMetadata { .. } => "Invalid meta for",
        }
    }

    /// What the harness observed, for the "Real output" line of a failure report.
    pub fn real_output(&self) -> String {
        match self {
            Outcome::Passed => String::new(),
            Outcome::Failed { actual, .. } => format!("{:?}", actual),
            Outcome::CompilationFailed(diagnostic) => format!("Compilation failed: {}", diagnostic),
            Outcome::CompilationError(err) => err.to_string(),
            Outcome::ExecutionError(err) => err.to_string(),
            Outcome::MissingMetadata => "no metadata".to_string(),
            Outcome::MalformedMetadata { inputs, outputs } => {
                format!("{} input scenario(s), {} expected output(s)", inputs, outputs)
            }
        }
    }
}

impl From<MetaError> for Outcome {
    fn from(err: MetaError) -> Self {
        match err {
            MetaError::Malformed { inputs, outputs } => Outcome::MalformedMetadata { inputs, outputs },
            MetaError::Missing(_) => Outcome::MissingMetadata,
            // Load failures abort the run before any lookup; if one surfaces here the entry is unusable.
            MetaError::Read { .. } | MetaError::Parse { .. } => Outcome::MissingMetadata,
        }
    }
}

/// What the subject last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealOutput {
    /// Result tokens parsed from interpreter stdout
    Parsed(Vec<String>),
    /// Failure detail from a step that produced no output
    Diagnostic(String),
}

/// Execution context of one scenario: the source under test, the artifact compiled from it, and
/// what has been observed so far. Dropping the subject deletes the artifact.
#[derive(Debug)]
pub struct TestSubject<'a> {
    source: &'a Path,
    expected: &'a [String],
    artifact: Option<Artifact>,
    real_output: Option<RealOutput>,
}

impl<'a> TestSubject<'a> {
    pub fn new(source: &'a Path, expected: &'a [String]) -> Self {
        Self {
            source,
            expected,
            artifact: None,
            real_output: None,
        }
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact.as_ref().map(Artifact::path)
    }

    pub fn real_output(&self) -> Option<&RealOutput> {
        self.real_output.as_ref()
    }

    fn compile(&mut self, compiler: &dyn Compile) -> Result<(), CompileError> {
        match compiler.compile(self.source) {
            Ok(artifact) => {
                self.artifact = Some(artifact);
                Ok(())
            }
            Err(err) => {
                self.real_output = Some(RealOutput::Diagnostic(err.to_string()));
                Err(err)
            }
        }
    }

    fn execute(&mut self, interpreter: &dyn Execute, input: &[u8]) -> Result<(), ExecError> {
        let Some(artifact) = self.artifact.as_ref() else {
            return Err(ExecError::Io {
                reason: "no compiled artifact".to_string(),
            });
        };
        match interpreter.run(artifact.path(), input) {
            Ok(raw) => {
                self.real_output = Some(RealOutput::Parsed(parse_output(&raw)));
                Ok(())
            }
            Err(err) => {
                self.real_output = Some(RealOutput::Diagnostic(err.to_string()));
                Err(err)
            }
        }
    }

    /// Run the full pipeline for one scenario.
    pub fn run(&mut self, compiler: &dyn Compile, interpreter: &dyn Execute, input: &[u8]) -> Outcome {
        if let Err(err) = self.compile(compiler) {
            return match err {
                CompileError::Syntax { diagnostic } => Outcome::CompilationFailed(diagnostic),
                other => Outcome::CompilationError(other),
            };
        }

        if let Err(err) = self.execute(interpreter, input) {
            return Outcome::ExecutionError(err);
        }

        match &self.real_output {
            Some(RealOutput::Parsed(actual)) if actual.as_slice() == self.expected => Outcome::Passed,
            Some(RealOutput::Parsed(actual)) => Outcome::Failed {
                expected: self.expected.to_vec(),
                actual: actual.clone(),
            },
            Some(RealOutput::Diagnostic(detail)) => Outcome::ExecutionError(ExecError::Io {
                reason: detail.clone(),
            }),
            None => Outcome::ExecutionError(ExecError::Io {
                reason: "no interpreter output recorded".to_string(),
            }),
        }
    }
}

/// Drives scenarios through a compiler and an interpreter.
#[derive(Debug, Clone)]
pub struct Classifier<C, E> {
    compiler: C,
    interpreter: E,
}

impl<C: Compile, E: Execute> Classifier<C, E> {
    pub fn new(compiler: C, interpreter: E) -> Self {
        Self { compiler, interpreter }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn interpreter(&self) -> &E {
        &self.interpreter
    }

    /// Classify scenario `index` of `case`, compiling `source` afresh.
    ///
    /// A malformed case, or an index the case does not declare, yields `MalformedMetadata`
    /// without touching the toolchain.
    pub fn classify(&self, source: &Path, case: &TestCase, index: usize) -> Outcome {
        if let Err(err) = case.validate() {
            return err.into();
        }
        match case.scenario(index) {
            Some(scenario) => self.run_scenario(source, scenario),
            None => Outcome::MalformedMetadata {
                inputs: case.input.len(),
                outputs: case.output.len(),
            },
        }
    }

    /// Classify every scenario of `case` in order. A malformed case yields a single
    /// `MalformedMetadata` outcome.
    #[tracing::instrument(skip_all, fields(source = %source.display(), title = %case.title))]
    pub fn classify_case(&self, source: &Path, case: &TestCase) -> Vec<Outcome> {
        if let Err(err) = case.validate() {
            tracing::debug!(%err, "skipping malformed case");
            return vec![err.into()];
        }
        case.scenarios().map(|scenario| self.run_scenario(source, scenario)).collect()
    }

    fn run_scenario(&self, source: &Path, scenario: Scenario<'_>) -> Outcome {
        let mut subject = TestSubject::new(source, scenario.expected);
        let outcome = subject.run(&self.compiler, &self.interpreter, &encode_input(scenario.input));
        if !outcome.is_passed() {
            tracing::debug!(scenario = scenario.index, real_output = ?subject.real_output(), "scenario did not pass");
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::meta::InputToken;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes the source path as the artifact, or fails as configured.
    #[derive(Default)]
    struct FakeCompiler {
        calls: AtomicUsize,
        fail: Option<CompileError>,
    }

    impl Compile for FakeCompiler {
        fn compile(&self, source: &Path) -> Result<Artifact, CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.fail {
                return Err(err.clone());
            }
            Artifact::write(source.to_string_lossy().as_bytes()).map_err(|e| CompileError::Artifact {
                reason: e.to_string(),
            })
        }
    }

    /// Echoes each input line as `> line`, recording every artifact path it sees.
    #[derive(Default)]
    struct EchoInterpreter {
        seen: Mutex<Vec<PathBuf>>,
        fail: Option<ExecError>,
        suffix: Option<String>,
    }

    impl Execute for EchoInterpreter {
        fn run(&self, artifact: &Path, input: &[u8]) -> Result<String, ExecError> {
            assert!(artifact.exists(), "artifact must exist while executing");
            self.seen.lock().unwrap().push(artifact.to_path_buf());
            if let Some(err) = &self.fail {
                return Err(err.clone());
            }
            let input = String::from_utf8(input.to_vec()).unwrap();
            let mut out: String = input.lines().map(|l| format!("? \n> {}\n", l)).collect();
            if let Some(extra) = &self.suffix {
                out.push_str(extra);
            }
            Ok(out)
        }
    }

    fn tokens(values: &[&str]) -> Vec<InputToken> {
        values.iter().map(|v| InputToken::from(*v)).collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn source() -> PathBuf {
        PathBuf::from("in/basic/read_put.imp")
    }

    #[test]
    fn test_echo_scenario_passes() {
        let classifier = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        let case = TestCase::new("read/put", vec![tokens(&["10"])], vec![strings(&["10"])]);
        assert_eq!(classifier.classify(&source(), &case, 0), Outcome::Passed);
    }

    #[test]
    fn test_mismatch_carries_both_sequences() {
        let classifier = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        let case = TestCase::new("t", vec![tokens(&["1", "2"])], vec![strings(&["1", "3"])]);
        assert_eq!(
            classifier.classify(&source(), &case, 0),
            Outcome::Failed {
                expected: strings(&["1", "3"]),
                actual: strings(&["1", "2"]),
            }
        );
    }

    #[test]
    fn test_extra_output_is_a_failure() {
        let interpreter = EchoInterpreter {
            suffix: Some("> 99\n".to_string()),
            ..Default::default()
        };
        let classifier = Classifier::new(FakeCompiler::default(), interpreter);
        let case = TestCase::new("t", vec![tokens(&["1"])], vec![strings(&["1"])]);
        assert!(matches!(classifier.classify(&source(), &case, 0), Outcome::Failed { .. }));
    }

    #[test]
    fn test_no_numeric_coercion() {
        let classifier = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        let case = TestCase::new("t", vec![tokens(&["010"])], vec![strings(&["10"])]);
        assert!(matches!(classifier.classify(&source(), &case, 0), Outcome::Failed { .. }));
    }

    #[test]
    fn test_malformed_case_never_compiles() {
        let classifier = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        let case = TestCase::new("t", vec![tokens(&["1"]), tokens(&["2"])], vec![strings(&["1"])]);

        assert_eq!(
            classifier.classify_case(&source(), &case),
            vec![Outcome::MalformedMetadata { inputs: 2, outputs: 1 }]
        );
        assert_eq!(
            classifier.classify(&source(), &case, 0),
            Outcome::MalformedMetadata { inputs: 2, outputs: 1 }
        );
        assert_eq!(classifier.compiler().calls.load(Ordering::SeqCst), 0);
        assert!(classifier.interpreter().seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_index_out_of_range() {
        let classifier = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        let case = TestCase::new("t", vec![tokens(&["1"])], vec![strings(&["1"])]);
        assert!(matches!(
            classifier.classify(&source(), &case, 5),
            Outcome::MalformedMetadata { .. }
        ));
        assert_eq!(classifier.compiler().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_syntax_error_is_compilation_failed() {
        let compiler = FakeCompiler {
            fail: Some(CompileError::Syntax {
                diagnostic: "Syntax error at line 3".to_string(),
            }),
            ..Default::default()
        };
        let classifier = Classifier::new(compiler, EchoInterpreter::default());
        let case = TestCase::new("t", vec![tokens(&[])], vec![strings(&["1"])]);

        assert_eq!(
            classifier.classify(&source(), &case, 0),
            Outcome::CompilationFailed("Syntax error at line 3".to_string())
        );
        assert!(classifier.interpreter().seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_compiler_fault_is_compilation_error() {
        let err = CompileError::Spawn {
            program: PathBuf::from("../compiler"),
            reason: "not found".to_string(),
        };
        let compiler = FakeCompiler {
            fail: Some(err.clone()),
            ..Default::default()
        };
        let classifier = Classifier::new(compiler, EchoInterpreter::default());
        let case = TestCase::new("t", vec![tokens(&[])], vec![strings(&[])]);
        assert_eq!(classifier.classify(&source(), &case, 0), Outcome::CompilationError(err));
    }

    #[test]
    fn test_interpreter_fault_is_execution_error() {
        let err = ExecError::Status {
            code: Some(1),
            stderr: "bad instruction".to_string(),
        };
        let interpreter = EchoInterpreter {
            fail: Some(err.clone()),
            ..Default::default()
        };
        let classifier = Classifier::new(FakeCompiler::default(), interpreter);
        let case = TestCase::new("t", vec![tokens(&["1"])], vec![strings(&["1"])]);
        assert_eq!(classifier.classify(&source(), &case, 0), Outcome::ExecutionError(err));
    }

    #[test]
    fn test_artifact_removed_in_every_branch() {
        let pass = TestCase::new("t", vec![tokens(&["1"])], vec![strings(&["1"])]);
        let fail = TestCase::new("t", vec![tokens(&["1"])], vec![strings(&["2"])]);

        let ok = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        ok.classify(&source(), &pass, 0);
        ok.classify(&source(), &fail, 0);

        let broken = Classifier::new(
            FakeCompiler::default(),
            EchoInterpreter {
                fail: Some(ExecError::Io { reason: "boom".into() }),
                ..Default::default()
            },
        );
        broken.classify(&source(), &pass, 0);

        let seen: Vec<PathBuf> = ok
            .interpreter()
            .seen
            .lock()
            .unwrap()
            .iter()
            .chain(broken.interpreter().seen.lock().unwrap().iter())
            .cloned()
            .collect();
        assert_eq!(seen.len(), 3);
        for path in seen {
            assert!(!path.exists(), "artifact {} leaked", path.display());
        }
    }

    #[test]
    fn test_each_scenario_gets_a_fresh_artifact() {
        let classifier = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        let case = TestCase::new(
            "sub",
            vec![tokens(&["5", "0"]), tokens(&["7", "101"])],
            vec![strings(&["5", "0"]), strings(&["7", "100"])],
        );

        let outcomes = classifier.classify_case(&source(), &case);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], Outcome::Passed);
        assert!(matches!(outcomes[1], Outcome::Failed { .. }));
        assert_eq!(classifier.compiler().calls.load(Ordering::SeqCst), 2);
        assert_eq!(classifier.interpreter().seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_reclassifying_is_stable() {
        let classifier = Classifier::new(FakeCompiler::default(), EchoInterpreter::default());
        let case = TestCase::new("t", vec![tokens(&["3", "4"])], vec![strings(&["3"])]);
        let first = classifier.classify(&source(), &case, 0);
        for _ in 0..3 {
            assert_eq!(classifier.classify(&source(), &case, 0), first);
        }
    }

    #[test]
    fn test_subject_records_real_output() {
        let compiler = FakeCompiler::default();
        let interpreter = EchoInterpreter::default();
        let expected = strings(&["8"]);
        let src = source();
        let mut subject = TestSubject::new(&src, &expected);

        let outcome = subject.run(&compiler, &interpreter, b"7");
        assert_eq!(
            outcome,
            Outcome::Failed {
                expected: strings(&["8"]),
                actual: strings(&["7"]),
            }
        );
        assert!(subject.artifact_path().is_some());
        let path = subject.artifact_path().unwrap().to_path_buf();
        drop(subject);
        assert!(!path.exists());
    }

    #[test]
    fn test_subject_keeps_diagnostic_on_failure() {
        let compiler = FakeCompiler {
            fail: Some(CompileError::Decode { reason: "bad byte".into() }),
            ..Default::default()
        };
        let expected = strings(&[]);
        let src = source();
        let mut subject = TestSubject::new(&src, &expected);
        subject.run(&compiler, &EchoInterpreter::default(), b"");
        assert!(matches!(subject.real_output(), Some(RealOutput::Diagnostic(d)) if d.contains("bad byte")));
        assert!(subject.artifact_path().is_none());
    }

    #[test]
    fn test_outcome_from_meta_error() {
        assert_eq!(Outcome::from(MetaError::Missing("x".into())), Outcome::MissingMetadata);
        assert_eq!(
            Outcome::from(MetaError::Malformed { inputs: 1, outputs: 0 }),
            Outcome::MalformedMetadata { inputs: 1, outputs: 0 }
        );
        let read = MetaError::Read {
            path: "meta.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(Outcome::from(read), Outcome::MissingMetadata);
        let parse = crate::meta::Registry::from_json_str("meta.json", "{").unwrap_err();
        assert!(matches!(parse, MetaError::Parse { .. }));
        assert_eq!(Outcome::from(parse), Outcome::MissingMetadata);
    }

    #[test]
    fn test_real_output_rendering() {
        let failed = Outcome::Failed {
            expected: strings(&["1"]),
            actual: strings(&["2", "3"]),
        };
        assert_eq!(failed.real_output(), r#"["2", "3"]"#);
        assert_eq!(
            Outcome::CompilationFailed("Syntax error".into()).real_output(),
            "Compilation failed: Syntax error"
        );
    }
}
