use chrono::{DateTime, Duration, Utc};

use super::{
    Agreement, AgreementStatus, AssigneeRecord, Comment, Document, DocumentSource, Message,
    Priority, Project, Subtask, Task, TaskStatus,
};

fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

fn task(id: &str, title: &str, status: TaskStatus, priority: Priority, assignee: &str, created_at: DateTime<Utc>) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        status,
        priority,
        assignee_id: Some(assignee.to_string()),
        due_date: None,
        created_at: Some(created_at),
        subtasks: None,
        comments: None,
        assignee_history: None,
    }
}

fn project(id: &str, name: &str, description: &str, persona: &str, theme: &str, greeting: (&str, &str), tasks: Vec<Task>) -> Project {
    Project {
        description: description.to_string(),
        theme: theme.to_string(),
        chat_history: vec![Message::from_assistant(greeting.0, greeting.1)],
        tasks,
        ..Project::new(id, name, persona)
    }
}

/// Projects a fresh workspace shows on its board
pub fn sample_projects() -> Vec<Project> {
    let now = Utc::now();

    let mockup = Task {
        description: Some(
            "Create high-fidelity mockups for the new homepage using Figma. Focus on the hero section and value propositions."
                .to_string(),
        ),
        subtasks: Some(
            [("st-1", "Hero Section"), ("st-2", "Footer"), ("st-3", "Mobile View")]
                .into_iter()
                .map(|(id, title)| Subtask { id: id.to_string(), title: title.to_string(), completed: true })
                .collect(),
        ),
        comments: Some(vec![Comment {
            id: "c-1".to_string(),
            user_id: "user-1".to_string(),
            content: "Looks great! Can we adjust the primary blue?".to_string(),
            created_at: days_ago(now, 2),
        }]),
        assignee_history: Some(vec![AssigneeRecord {
            user_id: "user-2".to_string(),
            assigned_at: days_ago(now, 5),
        }]),
        ..task("t-1", "Design Homepage Mockup", TaskStatus::Done, Priority::High, "user-2", days_ago(now, 5))
    };
    let components = Task {
        due_date: Some(now + Duration::days(2)),
        subtasks: Some(Vec::new()),
        comments: Some(Vec::new()),
        ..task("t-2", "Implement React Components", TaskStatus::InProgress, Priority::High, "user-1", days_ago(now, 2))
    };
    let seo = Task {
        subtasks: Some(Vec::new()),
        comments: Some(Vec::new()),
        ..task("t-3", "SEO Audit", TaskStatus::Todo, Priority::Low, "user-3", days_ago(now, 1))
    };

    vec![
        project(
            "proj-1",
            "Website Redesign",
            "Overhaul the corporate website with new branding.",
            "agent-2",
            "rose",
            ("msg-p1", "Welcome to the Website Redesign project workspace. I am ready to help with creative direction."),
            vec![mockup, components, seo],
        ),
        project(
            "proj-2",
            "Q3 Marketing Campaign",
            "Launch the new product line marketing blitz.",
            "agent-1",
            "violet",
            ("msg-p2", "Q3 Marketing Workspace initialized. Let's plan the campaign."),
            vec![
                task("t-4", "Draft Email Copy", TaskStatus::Todo, Priority::Medium, "user-2", days_ago(now, 3)),
                task("t-5", "Social Media Assets", TaskStatus::InProgress, Priority::Medium, "user-3", days_ago(now, 4)),
            ],
        ),
        project(
            "proj-3",
            "Mobile App Beta",
            "Prepare the iOS and Android builds for beta testers.",
            "agent-3",
            "cyan",
            ("msg-p3", "Technical workspace ready. Awaiting build instructions."),
            vec![
                task("t-6", "Setup TestFlight", TaskStatus::Done, Priority::High, "user-1", now),
                task("t-7", "Fix Crash on Login", TaskStatus::Todo, Priority::High, "user-1", now),
            ],
        ),
    ]
}

pub fn sample_documents() -> Vec<Document> {
    vec![
        Document {
            id: "doc-1".to_string(),
            name: "Brand_Guidelines_2024.pdf".to_string(),
            content: "Our brand colors are #FF5733 (Orange) and #33FF57 (Green). Tone of voice should be exciting and youthful."
                .to_string(),
            source: DocumentSource::Upload,
            is_active: true,
        },
        Document {
            id: "doc-2".to_string(),
            name: "Q3_Goals.gdoc".to_string(),
            content: "Primary goal: Increase user acquisition by 20%. Secondary goal: Improve retention by 5%.".to_string(),
            source: DocumentSource::Gdrive,
            is_active: false,
        },
    ]
}

/// Agreements the team has already signed
pub fn sample_agreements() -> Vec<Agreement> {
    let now = Utc::now();
    let agreement = |id: &str, title: &str, content: &str, days: i64, signatories: &[&str]| Agreement {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        status: AgreementStatus::Active,
        created_at: days_ago(now, days),
        signatories: signatories.iter().map(|s| s.to_string()).collect(),
    };

    vec![
        agreement(
            "agr-1",
            "Core Working Hours",
            "All team members agree to be available for synchronous communication between 10:00 AM and 3:00 PM EST. Flexible hours are permitted outside this window.",
            10,
            &["user-1", "user-2", "user-3"],
        ),
        agreement(
            "agr-2",
            "Code Review Standards",
            "All pull requests must have at least one approval from a senior engineer. No PRs to be merged on Fridays after 4 PM.",
            5,
            &["user-1", "user-3"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_board_matches_expected_layout() {
        let projects = sample_projects();
        let ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["proj-1", "proj-2", "proj-3"]);
        assert_eq!(projects.iter().map(|p| p.tasks.len()).sum::<usize>(), 7);

        let mockup = &projects[0].tasks[0];
        assert_eq!(mockup.status, TaskStatus::Done);
        assert!(mockup.subtasks.as_ref().unwrap().iter().all(|s| s.completed));
        assert!(projects[0].tasks[1].due_date.unwrap() > Utc::now());
        assert_eq!(projects[1].chat_history[0].user_id, crate::models::ASSISTANT_USER_ID);
    }

    #[test]
    fn sample_task_keeps_wire_shape() {
        let value = serde_json::to_value(&sample_projects()[0].tasks[0]).unwrap();
        assert_eq!(value["assigneeId"], "user-2");
        assert_eq!(value["assigneeHistory"][0]["userId"], "user-2");
        assert!(value.get("dueDate").is_none());
    }

    #[test]
    fn one_sample_document_is_active() {
        let active: Vec<String> = sample_documents().into_iter().filter(|d| d.is_active).map(|d| d.id).collect();
        assert_eq!(active, vec!["doc-1"]);
        assert_eq!(sample_agreements()[1].signatories, vec!["user-1", "user-3"]);
    }
}
