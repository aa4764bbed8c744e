use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Skill {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, alias = "institution")]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default, alias = "fieldOfStudy", skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A work history entry. Content lives either in `description` or in
/// `responsibilities`; the reconciler looks at responsibilities first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub label: String,
    pub url: String,
}

/// Root résumé entity. One canonical copy and at most one curated copy exist
/// per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Fields returned by the document parser. The parser speaks the flat shape
/// (`fullName` at the top level, skills as plain strings), and every field is
/// optional so that only what was extracted overrides the current document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedResume {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<Education>>,
    pub experience: Option<Vec<Experience>>,
    pub projects: Option<Vec<Project>>,
    pub links: Option<Vec<Link>>,
}

impl ResumeDocument {
    /// Shallow merge: each field present in `extracted` replaces the
    /// corresponding field wholesale. Absent fields are left alone.
    pub fn merge_extracted(&mut self, extracted: ExtractedResume) {
        if let Some(v) = extracted.full_name {
            self.personal_info.full_name = v;
        }
        if let Some(v) = extracted.email {
            self.personal_info.email = v;
        }
        if let Some(v) = extracted.phone {
            self.personal_info.phone = Some(v);
        }
        if let Some(v) = extracted.location {
            self.personal_info.location = Some(v);
        }
        if let Some(v) = extracted.summary {
            self.summary = Some(v);
        }
        if let Some(v) = extracted.skills {
            self.skills = v.into_iter().map(Skill::named).collect();
        }
        if let Some(v) = extracted.education {
            self.education = v;
        }
        if let Some(v) = extracted.experience {
            self.experience = v;
        }
        if let Some(v) = extracted.projects {
            self.projects = v;
        }
        if let Some(v) = extracted.links {
            self.links = v;
        }
    }

    pub fn has_skill(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.skills.iter().any(|s| s.name.to_lowercase() == name)
    }
}
