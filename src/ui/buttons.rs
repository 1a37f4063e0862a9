use serenity::builder::{CreateActionRow, CreateButton};

/// Navigation links shown under `botstats`.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationLinks {
    pub invite: String,
    pub support_server: Option<String>,
    pub dashboard: Option<String>,
}

/// Creates the row of link buttons
pub fn navigation_row(links: &NavigationLinks) -> CreateActionRow {
    let mut buttons = vec![CreateButton::new_link(&links.invite).label("Invite Link")];

    if let Some(support) = &links.support_server {
        buttons.push(CreateButton::new_link(support).label("Support Server"));
    }

    if let Some(dashboard) = &links.dashboard {
        buttons.push(CreateButton::new_link(dashboard).label("Dashboard Link"));
    }

    CreateActionRow::Buttons(buttons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(row: CreateActionRow) -> Vec<String> {
        let value = serde_json::to_value(row).unwrap();
        value["components"]
            .as_array()
            .unwrap()
            .iter()
            .map(|button| button["label"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn invite_is_always_present() {
        let links = NavigationLinks {
            invite: "https://discord.com/api/oauth2/authorize?client_id=1".to_string(),
            support_server: None,
            dashboard: None,
        };

        assert_eq!(labels(navigation_row(&links)), vec!["Invite Link"]);
    }

    #[test]
    fn optional_links_follow_configuration() {
        let links = NavigationLinks {
            invite: "https://discord.com/api/oauth2/authorize?client_id=1".to_string(),
            support_server: Some("https://discord.gg/support".to_string()),
            dashboard: Some("https://dash.example.com".to_string()),
        };

        assert_eq!(
            labels(navigation_row(&links)),
            vec!["Invite Link", "Support Server", "Dashboard Link"]
        );
    }
}
