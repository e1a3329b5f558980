use std::io::Write;

use drift::utils::Playbook;

const UNREACHABLE_ZABBIX: &str = r#"
rosters:
  - name: zabbix-down
    roster_type: zabbix
    traits: [zabbix]
    connection:
      url: http://127.0.0.1:9/api_jsonrpc.php
    auth:
      user: Admin
      password: zabbix
duties:
  - name: ensure template
    duty_type: ZabbixConfig
    spec:
      api: template
      api_uid: host
      api_args:
        host: tmpl1
"#;

fn write_playbook(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_login_failure_is_reported() {
    let file = write_playbook(UNREACHABLE_ZABBIX);
    let playbook = Playbook::from_file(file.path()).unwrap();
    let controller = drift::default_controller(playbook.rosters, false);

    let err = controller.run_duties(&playbook.duties).await.unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.starts_with("Duty 'ensure template' failed"));
    assert!(message.contains("Cannot login to zabbix api at http://127.0.0.1:9/api_jsonrpc.php"));
}

#[tokio::test]
async fn test_invalid_duty_fails_validation_before_any_call() {
    let file = write_playbook(
        r#"
rosters:
  - name: zabbix-down
    roster_type: zabbix
    traits: [zabbix]
    connection:
      url: http://127.0.0.1:9/api_jsonrpc.php
duties:
  - name: bad args
    duty_type: ZabbixConfig
    spec:
      api: template
      api_uid: host
      api_args:
        name: tmpl1
"#,
    );
    let playbook = Playbook::from_file(file.path()).unwrap();
    let controller = drift::default_controller(playbook.rosters, false);

    let err = controller.run_duties(&playbook.duties).await.unwrap_err();
    assert!(format!("{:#}", err).contains("No host provided in api_args"));
}

#[tokio::test]
async fn test_zabbix_duty_needs_zabbix_roster() {
    let file = write_playbook(
        r#"
duties:
  - name: orphan
    duty_type: ZabbixConfig
    spec:
      api: template
      api_uid: host
      api_args:
        host: tmpl1
"#,
    );
    let playbook = Playbook::from_file(file.path()).unwrap();
    let controller = drift::default_controller(playbook.rosters, false);

    let err = controller.run_duties(&playbook.duties).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Roster 'localhost' missing required trait 'zabbix'"));
}
