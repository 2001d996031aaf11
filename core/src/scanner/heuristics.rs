use super::{Finding, Severity};

/// 单条启发式规则，判定函数作用在去除首尾空白并小写化的行文本上
struct HeuristicRule {
    matches: fn(&str) -> bool,
    severity: Severity,
    title: &'static str,
    description: &'static str,
    suggestion: &'static str,
}

const SECRET_KEYWORDS: [&str; 5] = ["password", "secret", "api_key", "token", "key"];

// 密钥关键字后紧跟赋值（允许空格，排除 ==）才算命中
fn has_secret_assignment(line: &str) -> bool {
    SECRET_KEYWORDS.iter().any(|kw| {
        let mut start = 0;
        while let Some(pos) = line[start..].find(kw) {
            let after = start + pos + kw.len();
            let rest = line[after..].trim_start();
            if rest.starts_with('=') && !rest.starts_with("==") {
                return true;
            }
            start = after;
        }
        false
    })
}

pub struct HeuristicScanner {
    rules: Vec<HeuristicRule>,
}

impl HeuristicScanner {
    pub fn new() -> Self {
        let rules = vec![
            HeuristicRule {
                matches: |l| {
                    l.contains("execute(")
                        && (l.contains("%s")
                            || l.contains(".format(")
                            || l.contains("f\"")
                            || l.contains("f'"))
                },
                severity: Severity::Critical,
                title: "SQL Injection Risk",
                description: "SQL statement appears to be built with string formatting or interpolation",
                suggestion: "Use parameterized queries instead of formatting values into SQL text",
            },
            HeuristicRule {
                matches: |l| {
                    (l.contains("os.system(") || l.contains("subprocess."))
                        && (l.contains("input") || l.contains("user") || l.contains("request"))
                },
                severity: Severity::Critical,
                title: "Command Injection Risk",
                description: "Shell command constructed from user-controlled input",
                suggestion: "Pass a fixed argument list to the subprocess API and validate input",
            },
            HeuristicRule {
                matches: |l| l.contains("eval(") || l.contains("exec("),
                severity: Severity::Critical,
                title: "Code Injection Risk",
                description: "Dynamic code execution via eval/exec",
                suggestion: "Remove eval/exec or replace it with a safe dispatch table",
            },
            HeuristicRule {
                matches: |l| has_secret_assignment(l) && (l.contains('"') || l.contains('\'')),
                severity: Severity::High,
                title: "Hardcoded Credentials",
                description: "Credential literal assigned directly in source",
                suggestion: "Load secrets from environment variables or a secrets manager",
            },
            HeuristicRule {
                matches: |l| l.contains("pickle.load"),
                severity: Severity::High,
                title: "Unsafe Deserialization",
                description: "pickle deserialization can execute arbitrary code on untrusted data",
                suggestion: "Use a safe format such as JSON for data that crosses a trust boundary",
            },
            HeuristicRule {
                matches: |l| {
                    l.contains("open(")
                        && (l.contains("..") || l.contains("input") || l.contains("user"))
                },
                severity: Severity::Medium,
                title: "Path Traversal Risk",
                description: "File path assembled from user input or containing parent-directory references",
                suggestion: "Normalize the path and verify it stays inside an allowed root directory",
            },
            HeuristicRule {
                matches: |l| {
                    l.contains("random.")
                        && (l.contains("password") || l.contains("token") || l.contains("key"))
                },
                severity: Severity::Medium,
                title: "Weak Random Number Generation",
                description: "Non-cryptographic random source used for secret material",
                suggestion: "Use a cryptographically secure generator for passwords, tokens and keys",
            },
            HeuristicRule {
                matches: |l| l.contains("debug=true") || l.contains("debug = true"),
                severity: Severity::Medium,
                title: "Debug Mode Enabled",
                description: "Debug flag switched on",
                suggestion: "Disable debug mode outside local development",
            },
            HeuristicRule {
                matches: |l| l.contains("import *"),
                severity: Severity::Low,
                title: "Wildcard Import",
                description: "Wildcard import pollutes the namespace and hides symbol provenance",
                suggestion: "Import the required names explicitly",
            },
            HeuristicRule {
                matches: |l| {
                    l.contains("http://") && !l.contains("localhost") && !l.contains("127.0.0.1")
                },
                severity: Severity::Medium,
                title: "Insecure HTTP Connection",
                description: "Plaintext http:// URL pointing at a non-local host",
                suggestion: "Use https:// for all non-local endpoints",
            },
            HeuristicRule {
                matches: |l| l.contains("md5") || l.contains("sha1"),
                severity: Severity::Medium,
                title: "Weak Cryptographic Hash",
                description: "MD5 and SHA-1 are broken for integrity and password hashing",
                suggestion: "Use SHA-256 or a dedicated password hash such as bcrypt",
            },
            HeuristicRule {
                matches: |l| l.contains("chmod"),
                severity: Severity::Medium,
                title: "Unsafe File Permissions",
                description: "chmod call may grant overly broad file permissions",
                suggestion: "Restrict permissions to the minimum the application requires",
            },
            HeuristicRule {
                matches: |l| l.contains("innerhtml") || l.contains("dangerouslysetinnerhtml"),
                severity: Severity::High,
                title: "Cross-Site Scripting Risk",
                description: "Raw HTML injection sink receiving dynamic content",
                suggestion: "Escape or sanitize content before inserting it into the DOM",
            },
            HeuristicRule {
                matches: |l| l.contains('`') && l.contains("${"),
                severity: Severity::Low,
                title: "Template Literal Injection",
                description: "Template literal interpolation may embed untrusted values",
                suggestion: "Sanitize interpolated values or avoid building markup dynamically",
            },
        ];
        Self { rules }
    }

    /// 逐行扫描源码文本，行号从 1 起算
    ///
    /// 行按 `str::lines` 切分（LF 边界，行尾 CR 会被去掉）。同一行可以命中
    /// 多条规则，输出顺序为行号优先、规则表顺序次之。纯函数，结果可复现。
    pub fn scan(&self, source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (i, raw_line) in source.lines().enumerate() {
            let line = raw_line.trim().to_lowercase();
            for rule in &self.rules {
                if (rule.matches)(&line) {
                    findings.push(Finding {
                        severity: rule.severity,
                        title: rule.title.to_string(),
                        description: rule.description.to_string(),
                        line: Some(i + 1),
                        suggestion: rule.suggestion.to_string(),
                    });
                }
            }
        }

        findings
    }
}

impl Default for HeuristicScanner {
    fn default() -> Self {
        Self::new()
    }
}
