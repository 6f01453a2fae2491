/// The slice of a user the server embeds in invitation payloads
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    #[serde(with = "crate::util::ser::id_converter")]
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserSummary {
    /// "First Last" when we have it, the username otherwise
    pub fn display_name(&self) -> String {
        let parts = [self.first_name.as_ref(), self.last_name.as_ref()]
            .iter()
            .filter_map(|x| *x)
            .map(|x| x.trim())
            .filter(|x| !x.is_empty())
            .collect::<Vec<_>>();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// One hit from the user search endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserSearchResult {
    #[serde(with = "crate::util::ser::id_converter")]
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_participant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_invited: Option<bool>,
}

impl UserSearchResult {
    /// Can the organizer still send this person an invitation?
    pub fn is_invitable(&self) -> bool {
        !self.is_participant.unwrap_or(false) && !self.is_invited.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        let mut user: UserSummary = jedi::parse(r#"{"id":"9","username":"mdupont"}"#).unwrap();
        assert_eq!(user.id, 9);
        assert_eq!(user.display_name(), "mdupont");
        user.first_name = Some(String::from("Margot"));
        assert_eq!(user.display_name(), "Margot");
        user.last_name = Some(String::from("Dupont"));
        assert_eq!(user.display_name(), "Margot Dupont");
    }

    #[test]
    fn invitable() {
        let user: UserSearchResult = jedi::parse(r#"{"id":3,"username":"lea","is_invited":true}"#).unwrap();
        assert!(!user.is_invitable());
        let user: UserSearchResult = jedi::parse(r#"{"id":4,"username":"paul"}"#).unwrap();
        assert!(user.is_invitable());
    }
}
