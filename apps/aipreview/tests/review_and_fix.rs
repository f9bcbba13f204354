use aipreview::models::{Category, Fix, Finding, Severity, SpecChange};
use aipreview::rules::RuleMeta;
use aipreview::{Catalog, FixOptions, Fixer, ReviewOptions, Reviewer};
use proptest::prelude::*;
use serde_json::{json, Value};

fn review(spec: &Value, options: ReviewOptions) -> aipreview::models::ReviewResult {
    Reviewer::new(&Catalog::builtin(), options).review(spec, Some("api.json"))
}

fn manual(changes: Vec<SpecChange>) -> Finding {
    RuleMeta::new("test/manual", "Manual change", Category::Naming, Severity::Warning)
        .finding("spec", "manual")
        .with_fix(Fix::new("manual", "$", changes))
}

#[test]
fn plural_rule_flags_only_singular_collections() {
    let spec = json!({"paths": {"/user": {"get": {}}, "/orders": {"get": {}}}});
    let result = review(&spec, ReviewOptions::default());
    let plural: Vec<&Finding> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "naming/plural-resources")
        .collect();
    assert_eq!(plural.len(), 1);
    assert_eq!(plural[0].location, "/user");
    assert_eq!(plural[0].context.as_ref().unwrap()["segments"], json!(["user"]));
    assert!(!plural[0].message.contains("orders"));
}

#[test]
fn rename_key_applies_once() {
    let spec = json!({"paths": {"/user": {"get": {}}, "/orders": {}}});
    let finding = manual(vec![SpecChange::rename_key("$.paths", "/user", "/users")]);

    let mut fixer = Fixer::new(&spec, FixOptions::default());
    assert!(fixer.apply_fix(&finding).applied);
    let fixed = fixer.into_spec();
    let keys: Vec<&String> = fixed["paths"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["/users", "/orders"]);

    let mut again = Fixer::new(&fixed, FixOptions::default());
    let result = again.apply_fix(&finding);
    assert!(!result.applied);
    assert!(result.changes[0].error.as_deref().unwrap().contains("not found"));
}

#[test]
fn implicit_singleton_suppresses_database_findings() {
    let spec = json!({"paths": {
        "/v1/database/backup": {"post": {}},
        "/v1/database/restore": {"post": {}}
    }});
    let result = review(&spec, ReviewOptions::default());
    let mentions_database = result.findings.iter().any(|f| {
        (f.rule_id == "naming/plural-resources" || f.rule_id == "naming/verb-in-path") && f.message.contains("database")
    });
    assert!(!mentions_database, "{:?}", result.findings);
}

#[test]
fn merge_appends_parameters_in_order() {
    let spec = json!({"paths": {"/orders": {"get": {"parameters": [{"name": "existing"}]}}}});
    let finding = manual(vec![SpecChange::merge(
        "$.paths['/orders'].get.parameters",
        json!([{"name": "page_size"}, {"name": "page_token"}]),
    )]);
    let mut fixer = Fixer::new(&spec, FixOptions::default());
    assert!(fixer.apply_fix(&finding).applied);
    let params = fixer.get_spec()["paths"]["/orders"]["get"]["parameters"].as_array().unwrap();
    let names: Vec<&str> = params.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["existing", "page_size", "page_token"]);
}

#[test]
fn get_with_body_is_one_error_in_both_modes() {
    let spec = json!({"paths": {"/orders": {"get": {
        "requestBody": {"content": {"application/json": {}}}
    }}}});
    for strict in [false, true] {
        let result = review(
            &spec,
            ReviewOptions {
                strict,
                ..Default::default()
            },
        );
        let hits: Vec<&Finding> = result
            .findings
            .iter()
            .filter(|f| f.rule_id == "standard-methods/get-no-body")
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::Error);
    }
}

#[test]
fn strict_mode_promotes_warnings() {
    let spec = json!({
        "info": {"title": "Shop"},
        "paths": {
            "/user": {"get": {}},
            "/orders": {"get": {"parameters": [{"name": "sortBy", "in": "query"}]}}
        },
        "components": {"schemas": {"order_item": {"properties": {"Item-Id": {"type": "string"}}}}}
    });
    let normal = review(&spec, ReviewOptions::default());
    let strict = review(
        &spec,
        ReviewOptions {
            strict: true,
            ..Default::default()
        },
    );
    assert!(normal.summary.warnings > 0);
    assert_eq!(normal.findings.len(), strict.findings.len());
    for (n, s) in normal.findings.iter().zip(&strict.findings) {
        assert_eq!(n.rule_id, s.rule_id);
        assert_eq!(n.location, s.location);
        match n.severity {
            Severity::Warning => assert_eq!(s.severity, Severity::Error),
            other => assert_eq!(s.severity, other),
        }
    }
    assert_eq!(strict.summary.warnings, 0);
    assert!(strict.summary.errors >= normal.summary.errors + normal.summary.warnings);
}

#[test]
fn remove_absent_path_is_idempotent() {
    let spec = json!({"paths": {}});
    let finding = manual(vec![SpecChange::remove("$.paths['/gone'].get.requestBody")]);
    let mut fixer = Fixer::new(&spec, FixOptions::default());
    for _ in 0..2 {
        let result = fixer.apply_fix(&finding);
        assert!(result.applied);
        assert!(result.changes[0].error.is_none());
    }
    assert!(!fixer.has_errors());
    assert_eq!(fixer.get_spec(), &spec);
}

#[test]
fn review_then_fix_round_trip() {
    let spec = json!({
        "openapi": "3.0.3",
        "info": {"title": "Shop", "version": "1.0", "description": "Orders"},
        "paths": {"/v1/orders": {"get": {
            "summary": "List orders",
            "requestBody": {"content": {"application/json": {}}},
            "responses": {"200": {"description": "ok"}}
        }}}
    });
    let result = review(&spec, ReviewOptions::default());
    let mut fixer = Fixer::new(&spec, FixOptions::default());
    fixer.apply_fixes(result.fixable());
    assert!(!fixer.has_errors(), "{:?}", fixer.get_errors());

    let fixed = fixer.into_spec();
    let get = &fixed["paths"]["/v1/orders"]["get"];
    assert!(get.get("requestBody").is_none());
    assert_eq!(get["operationId"], "listOrders");
    assert!(get["responses"].get("default").is_some());
    assert!(fixed["components"]["schemas"].get("Error").is_some());

    let names: Vec<&str> = get["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert!(names.contains(&"page_size") && names.contains(&"page_token"));

    let again = review(&fixed, ReviewOptions::default());
    assert_eq!(again.summary.errors, 0);
    assert!(again.findings.iter().all(|f| f.rule_id != "pagination/list-paginated"));
}

#[test]
fn renamed_path_collects_every_operation_fix() {
    let spec = json!({
        "openapi": "3.0.3",
        "info": {"title": "Accounts", "version": "1.0", "description": "Users"},
        "paths": {"/user": {"get": {
            "summary": "List users",
            "responses": {"200": {"description": "ok"}}
        }}}
    });
    let result = review(&spec, ReviewOptions::default());
    assert!(result.fixable().any(|f| f.rule_id == "naming/plural-resources"));

    let mut fixer = Fixer::new(&spec, FixOptions::default());
    fixer.apply_review_fixes(result.fixable());
    assert!(!fixer.has_errors(), "{:?}", fixer.get_errors());

    let fixed = fixer.into_spec();
    let keys: Vec<&String> = fixed["paths"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["/users"]);
    let get = &fixed["paths"]["/users"]["get"];
    assert_eq!(get["summary"], "List users");
    assert!(get["operationId"].is_string());
    assert!(get["responses"].get("200").is_some());
    assert!(get["responses"].get("default").is_some());
}

#[test]
fn default_error_response_points_at_declared_schema() {
    let spec = json!({
        "openapi": "3.0.3",
        "paths": {"/orders": {"get": {"responses": {"200": {"description": "ok"}}}}},
        "components": {"schemas": {"ApiError": {"properties": {"code": {}, "message": {}}}}}
    });
    let result = review(&spec, ReviewOptions::default());
    let mut fixer = Fixer::new(&spec, FixOptions::default());
    fixer.apply_review_fixes(result.fixable());

    let fixed = fixer.into_spec();
    let default = &fixed["paths"]["/orders"]["get"]["responses"]["default"];
    assert_eq!(
        default["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/ApiError"
    );
    assert!(fixed["components"]["schemas"].get("Error").is_none());
}

#[test]
fn dry_run_leaves_document_untouched() {
    let spec = json!({"paths": {"/user": {"get": {}}}});
    let result = review(&spec, ReviewOptions::default());
    let mut fixer = Fixer::new(&spec, FixOptions { dry_run: true });
    let results = fixer.apply_fixes(result.fixable());
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.applied));
    assert_eq!(fixer.get_spec(), &spec);
}

#[test]
fn findings_survive_json_round_trip_into_fixer() {
    let spec = json!({"paths": {"/orders/{id}": {"get": {"requestBody": {"content": {}}}}}});
    let result = review(&spec, ReviewOptions::default());
    let text = serde_json::to_string(&result.findings).unwrap();
    let findings: Vec<Finding> = serde_json::from_str(&text).unwrap();
    let body = findings
        .iter()
        .find(|f| f.rule_id == "standard-methods/get-no-body")
        .unwrap();
    let mut fixer = Fixer::new(&spec, FixOptions::default());
    assert!(fixer.apply_fix(body).applied);
    assert!(fixer.get_spec()["paths"]["/orders/{id}"]["get"].get("requestBody").is_none());
}

proptest! {
    #[test]
    fn rename_key_preserves_sibling_order(
        keys in prop::collection::btree_set("[a-z]{1,6}", 2..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let from = keys[pick.index(keys.len())].clone();
        let to = format!("{}_renamed", from);
        let mut map = serde_json::Map::new();
        for (i, k) in keys.iter().enumerate() {
            map.insert(k.clone(), json!(i));
        }
        let spec = json!({"root": Value::Object(map)});

        let mut fixer = Fixer::new(&spec, FixOptions::default());
        let result = fixer.apply_fix(&manual(vec![SpecChange::rename_key("$.root", from.as_str(), to.as_str())]));
        prop_assert!(result.applied);

        let expected: Vec<String> = keys.iter().map(|k| if *k == from { to.clone() } else { k.clone() }).collect();
        let actual: Vec<String> = fixer.get_spec()["root"].as_object().unwrap().keys().cloned().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(&fixer.get_spec()["root"][&to], &spec["root"][&from]);
    }
}
