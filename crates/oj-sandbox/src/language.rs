/// The fixed four-language catalog (§4.D). Adding a language means adding a
/// variant here and nowhere else — every call site matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    C,
    Cpp,
    Python,
    Java,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "c" => Some(Language::C),
            "cpp" => Some(Language::Cpp),
            "python" => Some(Language::Python),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    pub fn source_filename(&self) -> &'static str {
        match self {
            Language::C => "main.c",
            Language::Cpp => "main.cpp",
            Language::Python => "main.py",
            Language::Java => "Main.java",
        }
    }

    /// The filename cached by `copyOutCached` after a successful compile and
    /// fed back in as `copyIn` on every subsequent run.
    pub fn artifact_filename(&self) -> &'static str {
        match self {
            Language::C | Language::Cpp => "main",
            Language::Python => "main.py",
            Language::Java => "Main.jar",
        }
    }

    /// Argv for the compile step. Java's is a shell pipeline (`javac` then
    /// `jar`), so it's wrapped in `sh -c`; the others run directly.
    pub fn compile_argv(&self) -> Vec<String> {
        match self {
            Language::C => owned(&["gcc", "main.c", "-std=gnu17", "-O2", "-static", "-s", "-o", "main"]),
            Language::Cpp => owned(&["g++", "main.cpp", "-std=gnu++17", "-O2", "-s", "-o", "main"]),
            // Validation only: python has no link step, so a clean
            // `py_compile` run is the closest equivalent to "compiled ok".
            Language::Python => owned(&["python3", "-m", "py_compile", "main.py"]),
            Language::Java => owned(&["sh", "-c", "javac Main.java && jar cfe Main.jar Main *.class"]),
        }
    }

    /// Argv for the run step, executed against the cached compile artifact.
    pub fn run_argv(&self) -> Vec<String> {
        match self {
            Language::C | Language::Cpp => owned(&["./main"]),
            Language::Python => owned(&["python3", "main.py"]),
            Language::Java => owned(&["java", "-jar", "Main.jar"]),
        }
    }
}

fn owned(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
