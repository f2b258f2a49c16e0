//! Tag operations for MockMaasClient

use super::MockMaasClient;
use crate::error::MaasError;
use crate::models::*;

pub fn list_tags(client: &MockMaasClient) -> Result<Vec<Tag>, MaasError> {
    client.journal("list_tags", "*");
    let tags = client.tags.lock().unwrap();
    Ok(tags.values().cloned().collect())
}

pub fn get_tag(client: &MockMaasClient, name: &str) -> Result<Tag, MaasError> {
    client.journal("get_tag", name);
    client
        .tags
        .lock()
        .unwrap()
        .get(name)
        .cloned()
        .ok_or_else(|| MaasError::NotFound(format!("Tag {} not found", name)))
}

pub fn create_tag(client: &MockMaasClient, name: &str, comment: Option<&str>) -> Result<Tag, MaasError> {
    client.journal("create_tag", name);
    let mut tags = client.tags.lock().unwrap();
    if tags.contains_key(name) {
        return Err(MaasError::InvalidRequest(format!("Tag {} already exists", name)));
    }
    let tag = Tag {
        name: name.to_string(),
        definition: String::new(),
        comment: comment.unwrap_or_default().to_string(),
    };
    tags.insert(name.to_string(), tag.clone());
    Ok(tag)
}

pub fn add_tag_to_machine(client: &MockMaasClient, tag: &str, system_id: &str) -> Result<(), MaasError> {
    if !client.tags.lock().unwrap().contains_key(tag) {
        client.journal("add_tag", system_id);
        return Err(MaasError::NotFound(format!("Tag {} not found", tag)));
    }
    client.with_machine("add_tag", system_id, |record, _| {
        if !record.machine.tag_names.iter().any(|t| t == tag) {
            record.machine.tag_names.push(tag.to_string());
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maas_trait::MaasClientTrait;

    #[tokio::test]
    async fn test_create_tag_rejects_duplicates() {
        let client = MockMaasClient::new("http://maas");
        client.create_tag("gpu", Some("GPU hosts")).await.unwrap();
        assert_eq!(client.get_tag("gpu").await.unwrap().comment, "GPU hosts");
        assert!(matches!(
            client.create_tag("gpu", None).await,
            Err(MaasError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_add_tag_requires_existing_tag() {
        let client = MockMaasClient::new("http://maas");
        client.add_machine(Machine {
            system_id: "m1".to_string(),
            hostname: "m1".to_string(),
            status: NodeStatus::Ready,
            status_name: "Ready".to_string(),
            power_state: PowerState::Off,
            power_type: "ipmi".to_string(),
            tag_names: vec!["legacy".to_string()],
        });

        assert!(client.add_tag_to_machine("gpu", "m1").await.is_err());
        client.add_tag("gpu");
        client.add_tag_to_machine("gpu", "m1").await.unwrap();
        client.add_tag_to_machine("gpu", "m1").await.unwrap();

        let tags = client.machine("m1").unwrap().tag_names;
        assert_eq!(tags, vec!["legacy".to_string(), "gpu".to_string()]);
    }
}
