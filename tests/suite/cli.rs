//! End-to-end runs of the `anchorage` binary: init, apply, show.

use serde_json::{Value, json};

use anchorage_types::{AnchorId, Fingerprint, LinkId};

use crate::common::{GENESIS, Workspace, account, call, call_with_value, stderr, stdout_lines};

fn anchor(label: &str) -> String {
    AnchorId::from_label(label).to_string()
}

fn fingerprint(label: &str) -> String {
    Fingerprint::from_label(label).to_string()
}

fn pin(label: &str) -> Value {
    json!({ "pin": { "id": anchor(label), "tier": 3, "fingerprint": fingerprint(label) } })
}

fn notification_names(outcome: &Value) -> Vec<String> {
    outcome["events"]
        .as_array()
        .expect("events array")
        .iter()
        .filter_map(|event| event["notification"].as_object())
        .filter_map(|notification| notification.keys().next().cloned())
        .collect()
}

#[test]
fn init_refuses_to_overwrite_state() {
    let ws = Workspace::new();
    ws.init();
    assert!(ws.state.exists());

    let again = ws.run(&["init", "--state", ws.state.to_str().expect("utf-8")]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));
}

#[test]
fn apply_reports_one_outcome_per_line_then_payouts() {
    let ws = Workspace::new();
    ws.init();

    let link = LinkId::from_label("l1").to_string();
    let lines = ws.apply(&[
        call("curator", GENESIS, pin("a1")),
        call("curator", GENESIS, pin("a2")),
        call("linker", GENESIS, pin("a3")),
        call(
            "linker",
            GENESIS + 1,
            json!({ "forge_link": {
                "id": link,
                "from": anchor("a1"),
                "to": anchor("a2"),
                "kind": 1,
                "strength": 50,
                "fingerprint": fingerprint("l1"),
            } }),
        ),
        call_with_value("staker", GENESIS + 2, 5, json!({ "stake": { "anchor": anchor("a1") } })),
        call("staker", GENESIS + 3, json!({ "release": { "anchor": anchor("a1") } })),
        call("staker", GENESIS + 500, json!({ "release": { "anchor": anchor("a1") } })),
        call_with_value("donor", GENESIS + 501, 1000, json!("deposit")),
        call(
            "curator",
            GENESIS + 502,
            json!({ "withdraw": { "to": account("treasurer"), "amount": 5000 } }),
        ),
    ]);

    let (outcomes, payouts) = lines.split_at(9);
    assert_eq!(outcomes[0]["op"], "pin");
    assert_eq!(outcomes[0]["ok"], true);
    assert_eq!(notification_names(&outcomes[0]), ["pinned"]);

    assert_eq!(outcomes[2]["ok"], false);
    assert!(
        outcomes[2]["error"]
            .as_str()
            .expect("error text")
            .contains("curator")
    );
    assert!(notification_names(&outcomes[2]).is_empty());

    assert_eq!(notification_names(&outcomes[3]), ["forged"]);
    assert_eq!(notification_names(&outcomes[4]), ["staked"]);
    assert_eq!(outcomes[4]["events"][0]["notification"]["staked"]["lock_until"], GENESIS + 2 + 128);

    assert_eq!(outcomes[5]["ok"], false);
    assert!(
        outcomes[5]["error"]
            .as_str()
            .expect("error text")
            .contains("locked")
    );
    assert_eq!(notification_names(&outcomes[6]), ["released"]);

    let deposited = &outcomes[7]["events"][0]["notification"]["deposited"];
    assert_eq!(deposited["fee"], 2);
    assert_eq!(deposited["working_balance"], 998);

    let withdrawn = &outcomes[8]["events"][0]["notification"]["withdrawn"];
    assert_eq!(withdrawn["requested"], 5000);
    assert_eq!(withdrawn["amount"], 998);

    assert_eq!(
        payouts,
        [
            json!({ "payout": { "to": account("staker"), "amount": 5 } }),
            json!({ "payout": { "to": account("treasurer"), "amount": 998 } }),
        ]
    );

    let snapshot = ws.show();
    assert_eq!(snapshot["anchors"]["total"], 2);
    assert_eq!(snapshot["total_links"], 1);
    assert_eq!(snapshot["occupied_slots"], 1);
    assert_eq!(snapshot["working_balance"], 0);
    assert_eq!(snapshot["fee_pool"], 2);
    assert_eq!(snapshot["escrow"], 0);
    assert_eq!(snapshot["first_anchors"].as_array().map(Vec::len), Some(2));
}

#[test]
fn state_carries_across_invocations() {
    let ws = Workspace::new();
    ws.init();
    ws.apply(&[call("curator", GENESIS, pin("a1"))]);

    let lines = ws.apply(&[
        call("curator", GENESIS + 1, pin("a1")),
        call("timekeeper", GENESIS + 128, json!("advance_epoch")),
        call("curator", GENESIS + 129, pin("a2")),
    ]);
    assert!(
        lines[0]["error"]
            .as_str()
            .expect("duplicate rejected")
            .contains("already exists")
    );
    assert_eq!(notification_names(&lines[1]), ["epoch_advanced"]);
    assert_eq!(lines[2]["events"][0]["notification"]["pinned"]["epoch"], 1);
    assert_eq!(lines[2]["events"][0]["sequence"], 2);

    let snapshot = ws.show();
    assert_eq!(snapshot["epoch"], 1);
    assert_eq!(snapshot["event_count"], 3);
}

#[test]
fn pause_blocks_pins_but_not_withdrawals() {
    let ws = Workspace::new();
    ws.init();
    let lines = ws.apply(&[
        call_with_value("donor", GENESIS, 10_000, json!("deposit")),
        call("curator", GENESIS, json!("pause")),
        call("curator", GENESIS + 1, pin("a1")),
        call(
            "curator",
            GENESIS + 1,
            json!({ "withdraw": { "to": account("curator"), "amount": 100 } }),
        ),
        call("curator", GENESIS + 2, json!("unpause")),
        call("curator", GENESIS + 2, pin("a1")),
    ]);
    assert_eq!(lines[2]["ok"], false);
    assert_eq!(lines[2]["error"], "registry is paused");
    assert_eq!(lines[3]["ok"], true);
    assert_eq!(lines[5]["ok"], true);
    assert_eq!(lines[6], json!({ "payout": { "to": account("curator"), "amount": 100 } }));
}

#[test]
fn malformed_script_leaves_state_untouched() {
    let ws = Workspace::new();
    ws.init();
    let good = call("curator", GENESIS, pin("a1"));
    let output = ws.apply_raw(&format!("{good}\n{{\"caller\":\"0x00\"}}\n"));
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid script line 2"));
    assert!(stdout_lines(&output).is_empty());

    assert_eq!(ws.show()["anchors"]["total"], 0);
}

#[test]
fn state_from_other_roles_is_refused() {
    let ws = Workspace::new();
    ws.init();
    ws.write_config("impostor");

    let output = ws.run(&["show", "--state", ws.state.to_str().expect("utf-8")]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("role assignment"));
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let ws = Workspace::new();
    ws.init();
    let pin_line = call("curator", GENESIS, pin("a1"));
    let output = ws.apply_raw(&format!("# bootstrap\n\n{pin_line}\n"));
    assert!(output.status.success(), "{}", stderr(&output));
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["line"], 3);
}
