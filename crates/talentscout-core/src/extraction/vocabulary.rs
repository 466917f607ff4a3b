//! Closed technology vocabulary.
//!
//! Used by the pattern fallback to recognise tech-stack mentions and by the
//! profile views to group a stack by category. A pattern written in lowercase
//! matches case-insensitively; a pattern containing uppercase letters must
//! match exactly. Only `Go` and `C` are exact-case, since "go" and "c" are
//! ordinary words; their lowercase forms count only when they sit in a list
//! next to another recognised term ("react, swift and go").

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    Languages,
    Frontend,
    Backend,
    Databases,
    Devops,
    Tools,
    Other,
}

impl fmt::Display for TechCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TechCategory::Languages => "languages",
            TechCategory::Frontend => "frontend",
            TechCategory::Backend => "backend",
            TechCategory::Databases => "databases",
            TechCategory::Devops => "devops",
            TechCategory::Tools => "tools",
            TechCategory::Other => "other",
        };
        f.write_str(label)
    }
}

/// One vocabulary entry.
#[derive(Debug)]
pub struct TechTerm {
    /// Display name written into the profile.
    pub name: &'static str,
    pub category: TechCategory,
    patterns: &'static [&'static str],
}

const fn term(
    name: &'static str,
    category: TechCategory,
    patterns: &'static [&'static str],
) -> TechTerm {
    TechTerm {
        name,
        category,
        patterns,
    }
}

use TechCategory::*;

pub static TECH_TERMS: &[TechTerm] = &[
    term("Python", Languages, &["python"]),
    term("Java", Languages, &["java"]),
    term("C", Languages, &["C"]),
    term("C++", Languages, &["c++", "cpp"]),
    term("C#", Languages, &["c#", "csharp"]),
    term("JavaScript", Languages, &["javascript"]),
    term("TypeScript", Languages, &["typescript"]),
    term("Ruby", Languages, &["ruby"]),
    term("Go", Languages, &["Go", "golang"]),
    term("Rust", Languages, &["rust"]),
    term("PHP", Languages, &["php"]),
    term("Swift", Languages, &["swift"]),
    term("Kotlin", Languages, &["kotlin"]),
    term("React", Frontend, &["react", "reactjs", "react.js"]),
    term("Angular", Frontend, &["angular"]),
    term("Vue", Frontend, &["vue", "vuejs", "vue.js"]),
    term("Svelte", Frontend, &["svelte"]),
    term("HTML", Frontend, &["html"]),
    term("CSS", Frontend, &["css"]),
    term("jQuery", Frontend, &["jquery"]),
    term("Bootstrap", Frontend, &["bootstrap"]),
    term("Tailwind", Frontend, &["tailwind", "tailwindcss"]),
    term("Django", Backend, &["django"]),
    term("Flask", Backend, &["flask"]),
    term("Spring", Backend, &["spring", "spring boot"]),
    term("Express", Backend, &["express", "expressjs", "express.js"]),
    term("Node.js", Backend, &["node.js", "nodejs"]),
    term("Laravel", Backend, &["laravel"]),
    term("Rails", Backend, &["rails", "ruby on rails"]),
    term("ASP.NET", Backend, &["asp.net"]),
    term("SQL", Databases, &["sql"]),
    term("MySQL", Databases, &["mysql"]),
    term("PostgreSQL", Databases, &["postgresql"]),
    term("Postgres", Databases, &["postgres"]),
    term("MongoDB", Databases, &["mongodb", "mongo"]),
    term("Redis", Databases, &["redis"]),
    term("Elasticsearch", Databases, &["elasticsearch"]),
    term("Cassandra", Databases, &["cassandra"]),
    term("Oracle", Databases, &["oracle"]),
    term("Docker", Devops, &["docker"]),
    term("Kubernetes", Devops, &["kubernetes", "k8s"]),
    term("Jenkins", Devops, &["jenkins"]),
    term("AWS", Devops, &["aws"]),
    term("Azure", Devops, &["azure"]),
    term("GCP", Devops, &["gcp"]),
    term("Terraform", Devops, &["terraform"]),
    term("Ansible", Devops, &["ansible"]),
    term("Git", Tools, &["git"]),
    term("Jira", Tools, &["jira"]),
    term("Confluence", Tools, &["confluence"]),
    term("Postman", Tools, &["postman"]),
    term("VS Code", Tools, &["vscode", "vs code"]),
    term("PyCharm", Tools, &["pycharm"]),
];

/// `(term index, matcher)` for every pattern of every term.
static MATCHERS: LazyLock<Vec<(usize, Regex)>> = LazyLock::new(|| {
    TECH_TERMS
        .iter()
        .enumerate()
        .flat_map(|(i, t)| t.patterns.iter().map(move |p| (i, matcher_for(p))))
        .collect()
});

fn matcher_for(pattern: &str) -> Regex {
    let flags = if pattern.chars().any(|c| c.is_ascii_uppercase()) {
        ""
    } else {
        "(?i)"
    };
    // Word-ish boundaries that keep `c` out of `c++`, `js` out of `node.js`,
    // and still accept a sentence-ending period.
    let source = format!(
        r"{flags}(?:^|[^A-Za-z0-9_+#.])({})(?:$|[^A-Za-z0-9_+#])",
        regex::escape(pattern)
    );
    Regex::new(&source).expect("vocabulary patterns are escaped literals")
}

/// Lowercase forms of exact-case terms, accepted only inside a list.
const LISTED_FORMS: &[(&str, &str)] = &[("Go", "go"), ("C", "c")];

/// `(term index, matchers)` for each listed form: the form after a list
/// separator, or the form before one.
static LIST_MATCHERS: LazyLock<Vec<(usize, [Regex; 2])>> = LazyLock::new(|| {
    LISTED_FORMS
        .iter()
        .filter_map(|(name, form)| {
            let index = TECH_TERMS.iter().position(|t| t.name == *name)?;
            let form = regex::escape(form);
            let after = format!(r"(?i)(?:,|/|&|\band\b|\bor\b)\s*({form})(?:$|[^A-Za-z0-9_+#])");
            let before = format!(r"(?i)(?:^|[^A-Za-z0-9_+#.])({form})\s*(?:,|/|&|\band\b|\bor\b)");
            Some((
                index,
                [
                    Regex::new(&after).expect("listed form patterns are escaped literals"),
                    Regex::new(&before).expect("listed form patterns are escaped literals"),
                ],
            ))
        })
        .collect()
});

fn first_match(matcher: &Regex, text: &str) -> Option<usize> {
    matcher
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.start())
}

fn record_hit(hits: &mut Vec<(usize, usize)>, index: usize, position: usize) {
    match hits.iter_mut().find(|(i, _)| *i == index) {
        Some(hit) => hit.1 = hit.1.min(position),
        None => hits.push((index, position)),
    }
}

/// Vocabulary terms mentioned in `text`, by order of first appearance.
pub fn find_tech_terms(text: &str) -> Vec<&'static TechTerm> {
    let mut hits: Vec<(usize, usize)> = Vec::new();
    for (index, matcher) in MATCHERS.iter() {
        if let Some(position) = first_match(matcher, text) {
            record_hit(&mut hits, *index, position);
        }
    }

    // A listed form needs some other term in the same text.
    for (index, matchers) in LIST_MATCHERS.iter() {
        if !hits.iter().any(|(i, _)| i != index) {
            continue;
        }
        if let Some(position) = matchers.iter().filter_map(|m| first_match(m, text)).min() {
            record_hit(&mut hits, *index, position);
        }
    }
    hits.sort_by_key(|&(_, position)| position);
    hits.into_iter().map(|(i, _)| &TECH_TERMS[i]).collect()
}

/// Look up a stack token (e.g. "postgres", "K8s") in the vocabulary.
pub fn lookup(token: &str) -> Option<&'static TechTerm> {
    let token = token.trim();
    TECH_TERMS.iter().find(|t| {
        t.name.eq_ignore_ascii_case(token) || t.patterns.iter().any(|p| p.eq_ignore_ascii_case(token))
    })
}

pub fn category_of(token: &str) -> TechCategory {
    lookup(token).map(|t| t.category).unwrap_or(Other)
}

/// Group stack tokens by category. Unknown tokens land under `Other`.
pub fn categorize(tokens: &[String]) -> BTreeMap<TechCategory, Vec<String>> {
    let mut groups: BTreeMap<TechCategory, Vec<String>> = BTreeMap::new();
    for token in tokens {
        groups
            .entry(category_of(token))
            .or_default()
            .push(token.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<&'static str> {
        find_tech_terms(text).iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_finds_terms_in_order_of_appearance() {
        assert_eq!(
            names("4 years experience with Go and Postgres, some docker"),
            vec!["Go", "Postgres", "Docker"]
        );
    }

    #[test]
    fn test_case_sensitive_short_terms() {
        assert!(names("let's go ahead").is_empty());
        assert!(names("I want to go and see").is_empty());
        assert_eq!(names("I write C and Go daily."), vec!["C", "Go"]);
    }

    #[test]
    fn test_lowercase_terms_match() {
        assert_eq!(names("i know react, swift and go"), vec!["React", "Swift", "Go"]);
        assert_eq!(
            names("spring boot, express and rails"),
            vec!["Spring", "Express", "Rails"]
        );
    }

    #[test]
    fn test_lowercase_short_terms_need_a_list() {
        assert_eq!(names("c, c++ and rust"), vec!["C", "C++", "Rust"]);
        assert_eq!(names("rust/go"), vec!["Rust", "Go"]);
        assert_eq!(names("rust, but I want to go home"), vec!["Rust"]);
        assert!(names("go, go, go").is_empty());
    }

    #[test]
    fn test_boundaries_distinguish_related_terms() {
        assert_eq!(names("mostly C++ and C#"), vec!["C++", "C#"]);
        assert_eq!(names("javascript on node.js"), vec!["JavaScript", "Node.js"]);
        assert_eq!(names("github and gitlab"), Vec::<&str>::new());
        assert_eq!(names("MySQL not sql"), vec!["MySQL", "SQL"]);
    }

    #[test]
    fn test_aliases_map_to_display_name() {
        assert_eq!(names("we run k8s with golang services"), vec!["Kubernetes", "Go"]);
    }

    #[test]
    fn test_sentence_final_period_accepted() {
        assert_eq!(names("also know Rust."), vec!["Rust"]);
    }

    #[test]
    fn test_repeated_mentions_reported_once() {
        assert_eq!(names("rust, Rust and more RUST"), vec!["Rust"]);
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(category_of("postgres"), Databases);
        assert_eq!(category_of("K8s"), Devops);
        assert_eq!(category_of("Go"), Languages);
        assert_eq!(category_of("Haskell"), Other);
    }

    #[test]
    fn test_categorize_groups_tokens() {
        let tokens = vec![
            "Go".to_string(),
            "Postgres".to_string(),
            "Rust".to_string(),
            "Haskell".to_string(),
        ];
        let groups = categorize(&tokens);
        assert_eq!(groups[&Languages], vec!["Go", "Rust"]);
        assert_eq!(groups[&Databases], vec!["Postgres"]);
        assert_eq!(groups[&Other], vec!["Haskell"]);
        assert!(!groups.contains_key(&Frontend));
    }
}
