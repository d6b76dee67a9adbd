use std::sync::LazyLock;

use regex::Regex;

type SkillTable = &'static [(&'static str, &'static [&'static str])];

/// Canonical name → spellings found in résumés. Ambiguous short words
/// (`go`, `r`, `c`, `vue`, `rest`) are only recognized in longer forms.
const TECHNICAL: SkillTable = &[
    ("Rust", &["rust"]),
    ("Python", &["python"]),
    ("Java", &["java"]),
    ("JavaScript", &["javascript", "js"]),
    ("TypeScript", &["typescript", "ts"]),
    ("Go", &["golang"]),
    ("C++", &["c++"]),
    ("C#", &["c#"]),
    ("PHP", &["php"]),
    ("Ruby", &["ruby", "ruby on rails", "rails"]),
    ("Kotlin", &["kotlin"]),
    ("Swift", &["swift"]),
    ("Scala", &["scala"]),
    ("SQL", &["sql"]),
    ("PostgreSQL", &["postgresql", "postgres"]),
    ("MySQL", &["mysql"]),
    ("MongoDB", &["mongodb", "mongo"]),
    ("Redis", &["redis"]),
    ("Elasticsearch", &["elasticsearch", "elastic search"]),
    ("Kafka", &["kafka"]),
    ("RabbitMQ", &["rabbitmq"]),
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("Terraform", &["terraform"]),
    ("Ansible", &["ansible"]),
    ("Jenkins", &["jenkins"]),
    ("GitLab CI", &["gitlab ci", "gitlab-ci"]),
    ("GitHub Actions", &["github actions"]),
    ("Git", &["git"]),
    ("Linux", &["linux", "unix"]),
    ("Bash", &["bash", "shell"]),
    ("AWS", &["aws", "amazon web services"]),
    ("Azure", &["azure"]),
    ("GCP", &["gcp", "google cloud"]),
    ("React", &["react", "reactjs", "react.js"]),
    ("Angular", &["angular"]),
    ("Vue.js", &["vue.js", "vuejs"]),
    ("Node.js", &["node.js", "nodejs"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("Spring", &["spring", "spring boot"]),
    (".NET", &[".net", "dotnet"]),
    ("HTML", &["html", "html5"]),
    ("CSS", &["css", "css3"]),
    ("REST", &["api rest", "rest api", "restful"]),
    ("GraphQL", &["graphql"]),
    ("Microservices", &["microservices", "micro-services"]),
    ("CI/CD", &["ci/cd"]),
    ("Agile", &["agile"]),
    ("Scrum", &["scrum"]),
    ("Jira", &["jira"]),
    ("Excel", &["excel"]),
    ("SAP", &["sap"]),
    ("Power BI", &["power bi", "powerbi"]),
    ("Machine Learning", &["machine learning", "apprentissage automatique"]),
    ("TensorFlow", &["tensorflow"]),
    ("PyTorch", &["pytorch"]),
    ("Pandas", &["pandas"]),
    ("Spark", &["spark"]),
    ("Prometheus", &["prometheus"]),
    ("Grafana", &["grafana"]),
    ("Nginx", &["nginx"]),
    ("Gestion de projet", &["gestion de projet", "project management"]),
];

const SOFT: SkillTable = &[
    ("Leadership", &["leadership"]),
    ("Communication", &["communication"]),
    (
        "Travail en équipe",
        &["travail en équipe", "travail en equipe", "esprit d'équipe", "esprit d'equipe", "teamwork"],
    ),
    ("Autonomie", &["autonomie", "autonome", "autonomous"]),
    ("Rigueur", &["rigueur", "rigoureux", "rigoureuse"]),
    ("Adaptabilité", &["adaptabilité", "adaptabilite", "adaptability"]),
    (
        "Résolution de problèmes",
        &["résolution de problèmes", "resolution de problemes", "problem solving", "problem-solving"],
    ),
    ("Organisation", &["organisation", "organisé", "organisée"]),
    ("Esprit d'analyse", &["esprit d'analyse", "sens de l'analyse", "analytical"]),
    ("Créativité", &["créativité", "creativite", "creativity"]),
    ("Curiosité", &["curiosité", "curiosite", "curiosity"]),
    ("Négociation", &["négociation", "negociation", "negotiation"]),
    ("Pédagogie", &["pédagogie", "pedagogie", "mentoring", "mentorat"]),
];

struct SkillPattern {
    canonical: String,
    pattern: Regex,
}

impl SkillPattern {
    fn new(canonical: &str, aliases: &[&str]) -> Option<Self> {
        let mut aliases: Vec<&str> = aliases.to_vec();
        aliases.sort_by_key(|a| std::cmp::Reverse(a.len()));
        let alternation = aliases
            .iter()
            .map(|a| regex::escape(a))
            .collect::<Vec<_>>()
            .join("|");
        // Letters, digits, '+' and '#' glue onto a word; anything else bounds it.
        let pattern = Regex::new(&format!(
            r"(?i)(?:^|[^\p{{L}}\p{{N}}_])(?:{alternation})(?:$|[^\p{{L}}\p{{N}}_+#])"
        ))
        .ok()?;
        Some(Self {
            canonical: canonical.to_string(),
            pattern,
        })
    }
}

/// Fixed technical and soft skill vocabularies, matched case-insensitively
/// on word boundaries. Results come back in order of first appearance.
pub struct SkillDictionary {
    technical: Vec<SkillPattern>,
    soft: Vec<SkillPattern>,
}

static STANDARD: LazyLock<SkillDictionary> = LazyLock::new(|| SkillDictionary::new(TECHNICAL, SOFT));

impl SkillDictionary {
    pub fn new(technical: SkillTable, soft: SkillTable) -> Self {
        let build = |table: SkillTable| {
            table
                .iter()
                .filter_map(|(canonical, aliases)| SkillPattern::new(canonical, aliases))
                .collect()
        };
        Self {
            technical: build(technical),
            soft: build(soft),
        }
    }

    pub fn standard() -> &'static SkillDictionary {
        &STANDARD
    }

    pub fn technical_in(&self, text: &str) -> Vec<String> {
        find_in(&self.technical, text)
    }

    pub fn soft_in(&self, text: &str) -> Vec<String> {
        find_in(&self.soft, text)
    }
}

fn find_in(patterns: &[SkillPattern], text: &str) -> Vec<String> {
    let text = text.replace('’', "'");
    let mut found: Vec<(usize, &str)> = patterns
        .iter()
        .filter_map(|p| p.pattern.find(&text).map(|m| (m.start(), p.canonical.as_str())))
        .collect();
    found.sort_by_key(|(position, _)| *position);
    found.into_iter().map(|(_, name)| name.to_string()).collect()
}
