#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatSource {
    /// Scalar stored by the estimation command, with optional p-value scalar.
    Scalar {
        key: &'static str,
        p_key: Option<&'static str>,
    },
    /// Estimate, standard error and p-value of the last parameter column.
    LastParameter,
    /// `1 - abs_dev{i} / raw_dev{i}` for the i-th equation (1-based).
    PseudoR2 {
        abs_dev: &'static str,
        raw_dev: &'static str,
    },
    /// `1 - sum_mdev[i] / sum_rdev[i]` from the deviation vectors.
    DeviationVectors,
    /// Entry of `e(first)` for the equation's instrumented variable.
    FirstStage {
        key: &'static str,
        p_key: Option<&'static str>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct StatDef {
    pub label: &'static str,
    pub source: StatSource,
    pub scale: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationName {
    Literal(&'static str),
    DepVar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationLayout {
    Single,
    /// Distinct equation names in column order.
    FromColumns,
    Defined(&'static [EquationName]),
    /// First stages in `stages` order, then the dependent variable from `b`/`V`.
    Stages,
    /// One equation per entry of `quantiles`, read from `coefmat`.
    Quantiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationMatch {
    Any,
    Named(EquationName),
    /// Every equation except the dependent variable's.
    Instrumented,
}

#[derive(Debug, Clone, Copy)]
pub struct EquationStatDef {
    pub equation: EquationMatch,
    pub stat: StatDef,
}

#[derive(Debug, Clone, Copy)]
pub struct FamilyDef {
    pub commands: &'static [&'static str],
    pub equations: EquationLayout,
    pub equation_stats: &'static [EquationStatDef],
    pub model_stats: &'static [StatDef],
}

const fn scalar(label: &'static str, key: &'static str, scale: u32) -> StatDef {
    StatDef {
        label,
        source: StatSource::Scalar { key, p_key: None },
        scale,
    }
}

const fn scalar_p(label: &'static str, key: &'static str, p_key: &'static str) -> StatDef {
    StatDef {
        label,
        source: StatSource::Scalar {
            key,
            p_key: Some(p_key),
        },
        scale: 2,
    }
}

const fn first_stage(label: &'static str, key: &'static str, p_key: Option<&'static str>) -> StatDef {
    StatDef {
        label,
        source: StatSource::FirstStage { key, p_key },
        scale: 2,
    }
}

const fn for_depvar(stat: StatDef) -> EquationStatDef {
    EquationStatDef {
        equation: EquationMatch::Named(EquationName::DepVar),
        stat,
    }
}

const fn for_instrumented(stat: StatDef) -> EquationStatDef {
    EquationStatDef {
        equation: EquationMatch::Instrumented,
        stat,
    }
}

const N: StatDef = scalar("N", "N", 0);
const R2: StatDef = scalar("R²", "r2", 2);
const R2_ADJ: StatDef = scalar("R² (adj.)", "r2_a", 2);

const HECKMAN_EQUATIONS: &[EquationName] = &[EquationName::Literal("select"), EquationName::DepVar];

const BUILTIN_FAMILIES: &[FamilyDef] = &[
    FamilyDef {
        commands: &["regress", "reghdfe"],
        equations: EquationLayout::Single,
        equation_stats: &[],
        model_stats: &[scalar("F", "F", 2), R2, R2_ADJ, N],
    },
    FamilyDef {
        commands: &["ivregress"],
        equations: EquationLayout::Single,
        equation_stats: &[],
        model_stats: &[scalar("Wald χ²", "chi2", 2), R2, R2_ADJ, N],
    },
    FamilyDef {
        commands: &["ivreghdfe"],
        equations: EquationLayout::Stages,
        equation_stats: &[
            for_instrumented(first_stage("F", "F", Some("pvalue"))),
            for_instrumented(first_stage("R²", "pr2", None)),
            for_depvar(scalar_p("F", "F", "Fp")),
            for_depvar(R2),
            for_depvar(R2_ADJ),
        ],
        model_stats: &[N],
    },
    FamilyDef {
        commands: &["xtreg", "xtivreg"],
        equations: EquationLayout::Single,
        equation_stats: &[],
        model_stats: &[
            scalar_p("F", "F", "p"),
            R2,
            R2_ADJ,
            N,
            scalar("Groups", "N_g", 0),
        ],
    },
    FamilyDef {
        commands: &["logit"],
        equations: EquationLayout::Single,
        equation_stats: &[],
        model_stats: &[
            scalar_p("Wald χ²", "chi2", "p"),
            scalar("Pseudo R²", "r2_p", 2),
            N,
        ],
    },
    FamilyDef {
        commands: &["sqreg"],
        equations: EquationLayout::FromColumns,
        equation_stats: &[EquationStatDef {
            equation: EquationMatch::Any,
            stat: StatDef {
                label: "Pseudo R²",
                source: StatSource::PseudoR2 {
                    abs_dev: "sumadv",
                    raw_dev: "sumrdv",
                },
                scale: 2,
            },
        }],
        model_stats: &[N],
    },
    FamilyDef {
        commands: &["qrprocess"],
        equations: EquationLayout::Quantiles,
        equation_stats: &[EquationStatDef {
            equation: EquationMatch::Any,
            stat: StatDef {
                label: "Pseudo R²",
                source: StatSource::DeviationVectors,
                scale: 2,
            },
        }],
        model_stats: &[N],
    },
    FamilyDef {
        commands: &["heckman"],
        equations: EquationLayout::Defined(HECKMAN_EQUATIONS),
        equation_stats: &[
            EquationStatDef {
                equation: EquationMatch::Named(EquationName::Literal("select")),
                stat: N,
            },
            EquationStatDef {
                equation: EquationMatch::Named(EquationName::DepVar),
                stat: scalar("N", "N_selected", 0),
            },
        ],
        model_stats: &[
            scalar_p("Wald χ²", "chi2", "p"),
            StatDef {
                label: "λ",
                source: StatSource::LastParameter,
                scale: 2,
            },
            scalar_p("ρ", "rho", "p_c"),
        ],
    },
];

static FALLBACK_FAMILY: FamilyDef = FamilyDef {
    commands: &[],
    equations: EquationLayout::Single,
    equation_stats: &[],
    model_stats: &[N],
};

pub fn family_for(command: &str) -> &'static FamilyDef {
    let command = command.trim();
    BUILTIN_FAMILIES
        .iter()
        .find(|f| f.commands.contains(&command))
        .unwrap_or(&FALLBACK_FAMILY)
}
