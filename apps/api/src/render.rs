//! Markdown export of a résumé. This is the document view a PDF exporter
//! consumes; pagination and styling happen downstream.

use crate::models::resume::{Education, Experience, Project, ResumeDocument};

pub fn render_resume_md(doc: &ResumeDocument) -> String {
    let info = &doc.personal_info;
    let name = if info.full_name.trim().is_empty() {
        "Resume"
    } else {
        info.full_name.trim()
    };
    let mut md = format!("# {name}\n\n");

    let contact: Vec<&str> = [
        Some(info.email.as_str()),
        info.phone.as_deref(),
        info.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect();
    if !contact.is_empty() {
        md.push_str(&contact.join(" | "));
        md.push_str("\n\n");
    }
    if !doc.links.is_empty() {
        let links: Vec<String> = doc
            .links
            .iter()
            .map(|l| format!("[{}]({})", l.label, l.url))
            .collect();
        md.push_str(&links.join(" | "));
        md.push_str("\n\n");
    }

    if let Some(summary) = doc.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        md.push_str("## Summary\n\n");
        md.push_str(summary);
        md.push_str("\n\n");
    }

    if !doc.experience.is_empty() {
        md.push_str("## Experience\n\n");
        for exp in &doc.experience {
            render_experience(&mut md, exp);
        }
    }

    if !doc.education.is_empty() {
        md.push_str("## Education\n\n");
        for edu in &doc.education {
            render_education(&mut md, edu);
        }
    }

    if !doc.projects.is_empty() {
        md.push_str("## Projects\n\n");
        for project in &doc.projects {
            render_project(&mut md, project);
        }
    }

    if !doc.skills.is_empty() {
        md.push_str("## Skills\n\n");
        let names: Vec<&str> = doc.skills.iter().map(|s| s.name.as_str()).collect();
        md.push_str(&names.join(", "));
        md.push('\n');
    }

    md
}

fn date_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    match (start.filter(|s| !s.is_empty()), end.filter(|s| !s.is_empty())) {
        (Some(s), Some(e)) => Some(format!("{s} – {e}")),
        (Some(s), None) => Some(format!("{s} – Present")),
        (None, Some(e)) => Some(e.to_string()),
        (None, None) => None,
    }
}

fn push_bullets(md: &mut String, items: Option<&[String]>) {
    for item in items.unwrap_or_default() {
        let item = item.trim();
        if !item.is_empty() {
            md.push_str(&format!("- {item}\n"));
        }
    }
}

fn render_experience(md: &mut String, exp: &Experience) {
    md.push_str(&format!("### {}", exp.title));
    if !exp.company.is_empty() {
        md.push_str(&format!(" — {}", exp.company));
    }
    md.push('\n');

    let mut meta = Vec::new();
    if let Some(range) = date_range(exp.start_date.as_deref(), exp.end_date.as_deref()) {
        meta.push(range);
    }
    if let Some(location) = exp.location.as_deref().filter(|l| !l.is_empty()) {
        meta.push(location.to_string());
    }
    if !meta.is_empty() {
        md.push_str(&format!("*{}*\n", meta.join(" · ")));
    }
    md.push('\n');

    if let Some(description) = exp.description.as_deref().filter(|d| !d.trim().is_empty()) {
        md.push_str(description.trim());
        md.push_str("\n\n");
    }
    if exp.responsibilities.as_ref().is_some_and(|r| !r.is_empty()) {
        push_bullets(md, exp.responsibilities.as_deref());
        md.push('\n');
    }
}

fn render_education(md: &mut String, edu: &Education) {
    let degree = match edu.field.as_deref().filter(|f| !f.is_empty()) {
        Some(field) => format!("{} in {field}", edu.degree),
        None => edu.degree.clone(),
    };
    md.push_str(&format!("### {degree} — {}\n", edu.school));

    let mut meta = Vec::new();
    if let Some(range) = date_range(edu.start_year.as_deref(), edu.end_year.as_deref()) {
        meta.push(range);
    }
    if let Some(gpa) = edu.gpa.as_deref().filter(|g| !g.is_empty()) {
        meta.push(format!("GPA {gpa}"));
    }
    if let Some(honors) = edu.honors.as_deref().filter(|h| !h.is_empty()) {
        meta.push(honors.to_string());
    }
    if !meta.is_empty() {
        md.push_str(&format!("*{}*\n", meta.join(" · ")));
    }
    md.push('\n');
}

fn render_project(md: &mut String, project: &Project) {
    match project.link.as_deref().filter(|l| !l.is_empty()) {
        Some(link) => md.push_str(&format!("### [{}]({link})\n", project.name)),
        None => md.push_str(&format!("### {}\n", project.name)),
    }
    if let Some(tech) = project.technologies.as_deref().filter(|t| !t.is_empty()) {
        md.push_str(&format!("*{tech}*\n"));
    }
    md.push('\n');
    if let Some(description) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
        md.push_str(description.trim());
        md.push_str("\n\n");
    }
    if project.responsibilities.as_ref().is_some_and(|r| !r.is_empty()) {
        push_bullets(md, project.responsibilities.as_deref());
        md.push('\n');
    }
}
