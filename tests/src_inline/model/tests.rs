use super::*;

fn estimation(json: &str) -> Estimation {
    let e: Estimation = serde_json::from_str(json).unwrap();
    e.validate().unwrap();
    e
}

fn rendered(column: &ModelColumn) -> Vec<(String, Option<String>)> {
    column
        .stats
        .iter()
        .map(|s| (s.label.clone(), s.render()))
        .collect()
}

#[test]
fn test_regress_single_column() {
    let e = estimation(
        r#"{
            "cmd": "regress",
            "depvar": "wage",
            "columns": ["age", "1b.region", "2.region", "_cons"],
            "table": [
                [0.5, 0, 1.25, 3.0],
                [0.1, null, 0.5, 1.0],
                [5.0, null, 2.5, 3.0],
                [0.001, null, 0.02, 0.003]
            ],
            "scalars": {"F": 12.345, "r2": 0.4567, "r2_a": null, "N": 250},
            "metadata": {"variables": {"wage": {"label": "Hourly wage"}}}
        }"#,
    );
    let columns = build_columns(&e);
    assert_eq!(columns.len(), 1);
    let col = &columns[0];
    assert_eq!(col.title, "Hourly wage");
    assert_eq!(col.params.len(), 4);
    assert!(col.params[1].term.is_base());
    assert_eq!(col.params[1].se, None);
    assert!(col.params[3].term.is_constant());
    assert_eq!(
        rendered(col),
        vec![
            ("F".to_string(), Some("12.35".to_string())),
            ("R²".to_string(), Some("0.46".to_string())),
            ("R² (adj.)".to_string(), None),
            ("N".to_string(), Some("250".to_string())),
        ]
    );
}

#[test]
fn test_engine_missing_codes() {
    let e = estimation(
        r#"{
            "cmd": "regress",
            "depvar": "y",
            "columns": ["x"],
            "table": [[8.988465674311579e307], [1e308], [0.0], [0.5]],
            "scalars": {"N": 9e307}
        }"#,
    );
    let p = e.parameter(0);
    assert_eq!(p.coef, None);
    assert_eq!(p.se, None);
    assert_eq!(p.p, Some(0.5));
    assert_eq!(e.scalar("N"), None);
    assert_eq!(e.scalar("absent"), None);
}

#[test]
fn test_unknown_command_reports_n_only() {
    let e = estimation(
        r#"{
            "cmd": "poisson",
            "depvar": "y",
            "columns": ["x"],
            "table": [[1.0], [0.1], [10.0], [0.0]],
            "scalars": {"N": 40, "r2": 0.3}
        }"#,
    );
    let columns = build_columns(&e);
    assert_eq!(
        rendered(&columns[0]),
        vec![("N".to_string(), Some("40".to_string()))]
    );
}

#[test]
fn test_xtreg_f_carries_stars() {
    let e = estimation(
        r#"{
            "cmd": "xtreg",
            "depvar": "y",
            "columns": ["x", "_cons"],
            "table": [[1.0, 2.0], [0.1, 0.2], [10.0, 10.0], [0.0, 0.0]],
            "scalars": {"F": 25.0, "p": 0.0001, "r2": 0.3, "r2_a": 0.29, "N": 500, "N_g": 50}
        }"#,
    );
    let stats = rendered(&build_columns(&e)[0]);
    assert_eq!(stats[0], ("F".to_string(), Some("25.00***".to_string())));
    assert_eq!(stats[4], ("Groups".to_string(), Some("50".to_string())));
}

#[test]
fn test_sqreg_one_column_per_quantile() {
    let e = estimation(
        r#"{
            "cmd": "sqreg",
            "depvar": "y",
            "columns": ["x", "_cons", "x", "_cons"],
            "equations": ["q10", "q10", "q50", "q50"],
            "table": [
                [1.0, 2.0, 1.5, 2.5],
                [0.1, 0.2, 0.1, 0.2],
                [10.0, 10.0, 15.0, 12.5],
                [0.0, 0.0, 0.0, 0.0]
            ],
            "scalars": {"N": 100, "sumadv1": 30.0, "sumrdv1": 40.0, "sumadv2": 20.0, "sumrdv2": 0.0}
        }"#,
    );
    let columns = build_columns(&e);
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].title, "y (q10)");
    assert_eq!(columns[1].title, "y (q50)");
    assert_eq!(columns[0].params.len(), 2);
    assert_eq!(columns[1].params[0].coef, Some(1.5));
    assert_eq!(
        rendered(&columns[0]),
        vec![
            ("Pseudo R²".to_string(), Some("0.25".to_string())),
            ("N".to_string(), Some("100".to_string())),
        ]
    );
    // zero raw deviation leaves the statistic missing
    assert_eq!(rendered(&columns[1])[0].1, None);
}

#[test]
fn test_heckman_select_then_outcome() {
    let e = estimation(
        r#"{
            "cmd": "heckman",
            "depvar": "wage",
            "columns": ["educ", "_cons", "married", "_cons", "_cons"],
            "equations": ["wage", "wage", "select", "select", "mills"],
            "table": [
                [0.9, 4.0, 0.4, 0.1, 1.234],
                [0.1, 0.5, 0.1, 0.05, 0.2],
                [9.0, 8.0, 4.0, 2.0, 6.0],
                [0.0, 0.0, 0.0, 0.04, 0.03]
            ],
            "scalars": {"N": 2000, "N_selected": 1343, "chi2": 80.0, "p": 0.0, "rho": 0.67, "p_c": 0.2}
        }"#,
    );
    let columns = build_columns(&e);
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].title, "wage (select)");
    assert_eq!(columns[1].title, "wage (wage)");
    assert_eq!(columns[0].params[0].term.token, "married");

    let select = rendered(&columns[0]);
    assert_eq!(select[0], ("N".to_string(), Some("2000".to_string())));
    assert_eq!(select[1], ("Wald χ²".to_string(), Some("80.00***".to_string())));
    assert_eq!(select[2], ("λ".to_string(), Some("1.23** (0.20)".to_string())));
    assert_eq!(select[3], ("ρ".to_string(), Some("0.67".to_string())));

    let outcome = rendered(&columns[1]);
    assert_eq!(outcome[0], ("N".to_string(), Some("1343".to_string())));
    assert_eq!(outcome.len(), 4);
}

#[test]
fn test_equations_without_parameters_fall_back() {
    let e = estimation(
        r#"{
            "cmd": "heckman",
            "depvar": "y",
            "columns": ["x"],
            "equations": ["other"],
            "table": [[1.0], [0.1], [10.0], [0.0]]
        }"#,
    );
    let columns = build_columns(&e);
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].title, "y");
    assert_eq!(columns[0].params.len(), 1);
}

#[test]
fn test_validate_errors() {
    let parse = |json: &str| serde_json::from_str::<Estimation>(json).unwrap().validate();

    assert!(matches!(
        parse(r#"{"cmd": "regress", "depvar": "y", "columns": [], "table": []}"#),
        Err(ModelError::NoColumns)
    ));
    assert!(matches!(
        parse(r#"{"cmd": "regress", "depvar": "y", "columns": ["x"], "table": [[1], [2], [3]]}"#),
        Err(ModelError::MissingTableRows { needed: 4, found: 3 })
    ));
    assert!(matches!(
        parse(r#"{"cmd": "regress", "depvar": "y", "columns": ["x"], "table": [[1], [2, 3], [3], [4]]}"#),
        Err(ModelError::TableWidth { row: 1, found: 2, expected: 1 })
    ));
    assert!(matches!(
        parse(
            r#"{"cmd": "sqreg", "depvar": "y", "columns": ["x"], "equations": ["a", "b"], "table": [[1], [2], [3], [4]]}"#
        ),
        Err(ModelError::EquationCount { found: 2, expected: 1 })
    ));
}

#[test]
fn test_two_sided_t_p_value() {
    let p = matrix::two_sided_p(2.0, 1.0, 100.0).unwrap();
    assert!((p - 0.0482).abs() < 1e-3, "p = {p}");
    let p = matrix::two_sided_p(-1.96, 1.0, 1000.0).unwrap();
    assert!((p - 0.05).abs() < 1e-3, "p = {p}");
    assert_eq!(matrix::two_sided_p(1.0, 0.0, 10.0), None);
    assert_eq!(matrix::two_sided_p(1.0, 1.0, -3.0), None);
}

#[test]
fn test_ivreghdfe_first_stages_then_depvar() {
    let e = estimation(
        r#"{
            "cmd": "ivreghdfe",
            "depvar": "y",
            "columns": ["x1", "w", "_cons"],
            "b": [0.5, 1.0, 2.0],
            "V": [[0.01, 0, 0], [0, 0.25, 0], [0, 0, 1.0]],
            "scalars": {"N": 200, "F": 30, "Fp": 0.0001, "r2": 0.4, "r2_a": 0.38, "df_r": 50},
            "first": {"x1": {"F": 45.2, "pvalue": 0.0, "pr2": 0.31}},
            "stages": [{
                "equation": "x1",
                "columns": ["z", "w", "_cons"],
                "b": [0.8, 0.1, 0.0],
                "V": [[0.04, 0, 0], [0, 0.01, 0], [0, 0, 0]],
                "df_r": 50
            }]
        }"#,
    );
    let columns = build_columns(&e);
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].title, "y (x1)");
    assert_eq!(columns[1].title, "y (y)");

    let z = &columns[0].params[0];
    assert_eq!(z.term.token, "z");
    assert_eq!(z.coef, Some(0.8));
    assert!((z.se.unwrap() - 0.2).abs() < 1e-12);
    assert!(z.p.unwrap() < 0.01);
    // zero variance has no test statistic
    assert_eq!(columns[0].params[2].p, None);

    let x1 = &columns[1].params[0];
    assert!((x1.se.unwrap() - 0.1).abs() < 1e-12);
    assert!(x1.p.unwrap() < 0.01);

    assert_eq!(
        rendered(&columns[0]),
        vec![
            ("F".to_string(), Some("45.20***".to_string())),
            ("R²".to_string(), Some("0.31".to_string())),
            ("N".to_string(), Some("200".to_string())),
        ]
    );
    assert_eq!(
        rendered(&columns[1]),
        vec![
            ("F".to_string(), Some("30.00***".to_string())),
            ("R²".to_string(), Some("0.40".to_string())),
            ("R² (adj.)".to_string(), Some("0.38".to_string())),
            ("N".to_string(), Some("200".to_string())),
        ]
    );
}

#[test]
fn test_qrprocess_one_column_per_quantile() {
    let e = estimation(
        r#"{
            "cmd": "qrprocess",
            "depvar": "y",
            "columns": ["x", "_cons"],
            "coefmat": [[1.0, 2.0], [0.0, 3.0]],
            "V": [
                [0.25, 0, 0, 0],
                [0, 0.0, 0, 0],
                [0, 0, 1.0, 0],
                [0, 0, 0, 4.0]
            ],
            "quantiles": [0.25, 0.75],
            "sum_mdev": [30.0, 20.0],
            "sum_rdev": [40.0, 80.0],
            "scalars": {"N": 120, "df_r": 100}
        }"#,
    );
    let columns = build_columns(&e);
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].title, "y (Q=0.25)");
    assert_eq!(columns[1].title, "y (Q=0.75)");

    let x = &columns[0].params[0];
    assert_eq!((x.coef, x.se), (Some(1.0), Some(0.5)));
    assert!((x.p.unwrap() - 0.0482).abs() < 1e-3);
    // zero coefficient with zero variance could not be estimated
    let cons = &columns[0].params[1];
    assert_eq!((cons.coef, cons.se, cons.p), (None, None, None));
    assert_eq!(columns[1].params[1].se, Some(2.0));

    assert_eq!(
        rendered(&columns[0]),
        vec![
            ("Pseudo R²".to_string(), Some("0.25".to_string())),
            ("N".to_string(), Some("120".to_string())),
        ]
    );
    assert_eq!(rendered(&columns[1])[0].1.as_deref(), Some("0.75"));
}

#[test]
fn test_matrix_families_validate_shapes() {
    let parse = |json: &str| serde_json::from_str::<Estimation>(json).unwrap().validate();

    assert!(matches!(
        parse(r#"{"cmd": "qrprocess", "depvar": "y", "columns": ["x"], "quantiles": [0.5], "V": [[1]]}"#),
        Err(ModelError::MissingMatrix("coefmat"))
    ));
    assert!(matches!(
        parse(
            r#"{"cmd": "qrprocess", "depvar": "y", "columns": ["x"], "quantiles": [0.5, 0.9],
                "coefmat": [[1, 2]], "V": [[1]]}"#
        ),
        Err(ModelError::MatrixShape { name: "V", found: 1, expected: 2 })
    ));
    assert!(matches!(
        parse(r#"{"cmd": "ivreghdfe", "depvar": "y", "columns": ["x", "_cons"], "b": [1], "V": [[1]]}"#),
        Err(ModelError::MatrixShape { name: "b", found: 1, expected: 2 })
    ));
    assert!(matches!(
        parse(
            r#"{"cmd": "ivreghdfe", "depvar": "y", "columns": ["x"], "b": [1], "V": [[1]],
                "stages": [{"equation": "x", "columns": ["z"], "b": [1], "V": []}]}"#
        ),
        Err(ModelError::MatrixShape { name: "V", found: 0, expected: 1 })
    ));
}
