use serde::Serialize;

/// Sheet column holding the submission time.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Sheet column holding the whole record serialized as JSON.
pub const PAYLOAD_COLUMN: &str = "payload_json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetKind {
    TextInput,
    TextArea { height: u16 },
    Radio { options: &'static [&'static str] },
    MultiSelect { options: &'static [&'static str] },
}

impl WidgetKind {
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::Radio { options } | Self::MultiSelect { options } => options,
            Self::TextInput | Self::TextArea { .. } => &[],
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Self::MultiSelect { .. })
    }
}

/// One questionnaire field: its form key, the sheet column it lands in, and how
/// it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub column: &'static str,
    pub label: &'static str,
    pub kind: WidgetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheading: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

pub const FOCUS_OPTIONS: &[&str] = &[
    "Comportamento mecânico",
    "Durabilidade",
    "Modelagem numérica",
    "Dosagem e microestrutura",
    "Aplicações estruturais",
    "Desenvolvimento de metodologia",
    "Outro",
];

pub const STUDY_TYPE_OPTIONS: &[&str] = &[
    "Experimental",
    "Numérico",
    "Teórico",
    "Experimental + Numérico",
];

pub const TOPIC_ORIGIN_OPTIONS: &[&str] = &[
    "Evolução de pesquisa da graduação",
    "Continuação de projeto do orientador",
    "Tema novo dentro do grupo",
];

const fn text(key: &'static str, column: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        column,
        label,
        kind: WidgetKind::TextInput,
        default: None,
        subheading: None,
    }
}

const fn area(
    key: &'static str,
    column: &'static str,
    label: &'static str,
    height: u16,
) -> FieldSpec {
    FieldSpec {
        key,
        column,
        label,
        kind: WidgetKind::TextArea { height },
        default: None,
        subheading: None,
    }
}

const fn radio(
    key: &'static str,
    column: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        key,
        column,
        label,
        kind: WidgetKind::Radio { options },
        default: None,
        subheading: None,
    }
}

const fn under(field: FieldSpec, subheading: &'static str) -> FieldSpec {
    FieldSpec {
        subheading: Some(subheading),
        ..field
    }
}

const fn with_default(field: FieldSpec, default: &'static str) -> FieldSpec {
    FieldSpec {
        default: Some(default),
        ..field
    }
}

pub static SECTIONS: &[Section] = &[
    Section {
        title: "1. Identificação Básica",
        fields: &[
            text("titulo", "titulo", "1. Título provisório"),
            text("orientador", "orientador", "2. Nome do orientador"),
            text("area", "area_concentracao", "3. Área de concentração do programa"),
            text("linha", "linha_pesquisa", "4. Linha de pesquisa formal do programa"),
            area(
                "vinculo",
                "vinculo_projeto_maior",
                "5. Projeto maior vinculado (FAPESP/CNPq/parceria)?",
                100,
            ),
        ],
    },
    Section {
        title: "2. Contexto Geral da Pesquisa",
        fields: &[
            area("problema", "problema", "6. Problema técnico/científico", 110),
            area(
                "relevancia",
                "relevancia",
                "7. Relevância hoje (aplicação, custo, sustentabilidade...)",
                110,
            ),
            FieldSpec {
                key: "foco",
                column: "foco",
                label: "8. Foco principal:",
                kind: WidgetKind::MultiSelect {
                    options: FOCUS_OPTIONS,
                },
                default: None,
                subheading: None,
            },
            text("foco_outro", "foco_outro", "Se marcou 'Outro', especifique:"),
        ],
    },
    Section {
        title: "3. Delimitação Técnica",
        fields: &[
            area("delimitacao", "delimitacao", "9. Delimitação técnica", 120),
            radio(
                "tipo_estudo",
                "tipo_estudo",
                "10. O estudo será:",
                STUDY_TYPE_OPTIONS,
            ),
            under(
                area("ensaios", "ensaios", "11a. Ensaios pretendidos", 90),
                "Parte experimental",
            ),
            text(
                "laboratorio",
                "laboratorio",
                "11b. Laboratório disponível (qual)?",
            ),
            text(
                "traco",
                "traco_uhpfrc",
                "11c. Traço UHPFRC definido? (sim/não + detalhes)",
            ),
            under(
                text(
                    "software",
                    "software",
                    "12a. Software(s) (ABAQUS/ANSYS/OpenSees/código próprio...)",
                ),
                "Parte numérica",
            ),
            text(
                "modelo_constitutivo",
                "modelo_constitutivo",
                "12b. Modelo constitutivo? (sim/não + ideia)",
            ),
            text(
                "ml",
                "ml",
                "12c. Machine learning? (sim/não + onde faria sentido)",
            ),
        ],
    },
    Section {
        title: "4. Estado da Arte",
        fields: &[
            area(
                "artigos_base",
                "artigos_base",
                "13. Artigos/referências base",
                110,
            ),
            area("lacuna", "lacuna", "14. Lacuna percebida na literatura", 110),
            radio(
                "origem_tema",
                "origem_tema",
                "15. Seu trabalho será:",
                TOPIC_ORIGIN_OPTIONS,
            ),
            area(
                "conexao",
                "conexao_pesquisas",
                "15b. Conexão com pesquisas anteriores",
                110,
            ),
        ],
    },
    Section {
        title: "5. Hipóteses e Objetivos",
        fields: &[
            area("hipotese", "hipotese", "16. Hipótese central", 90),
            area("obj_geral", "objetivo_geral", "17. Objetivo geral", 80),
            area(
                "obj_especificos",
                "objetivos_especificos",
                "18. Objetivos específicos (3–5)",
                120,
            ),
        ],
    },
    Section {
        title: "6. Metodologia",
        fields: &[
            area("etapas", "etapas", "19. Etapas técnicas do trabalho", 120),
            area(
                "pretende",
                "pretende",
                "20. Pretende (paramétrica, comparar, propor modelo, validar norma...)",
                110,
            ),
        ],
    },
    Section {
        title: "7. Resultados Esperados",
        fields: &[
            area("produtos", "produtos", "21. Produtos finais esperados", 110),
            area(
                "contribuicao",
                "contribuicao",
                "22. Contribuição científica principal",
                110,
            ),
        ],
    },
    Section {
        title: "8. Cronograma",
        fields: &[
            with_default(
                text("duracao", "duracao_meses", "23. Duração prevista (meses)"),
                "24",
            ),
            text("qualif", "qualificacao_meses", "24. Qualificação (meses)"),
            text(
                "artigo",
                "submissao_artigo",
                "25. Submeter artigo antes da defesa? (sim/não + quando)",
            ),
        ],
    },
    Section {
        title: "9. Infraestrutura e Viabilidade",
        fields: &[
            text(
                "conversou",
                "viabilidade_orientador",
                "26. Viabilidade com orientador (sim/não + notas)",
            ),
            text(
                "financiamento",
                "financiamento",
                "27. Financiamento previsto (bolsa/agência/projeto)",
            ),
            text("parceria", "parceria", "28. Parceria com empresa?"),
        ],
    },
    Section {
        title: "10. Diferencial do Candidato",
        fields: &[
            area(
                "formacao",
                "formacao_contribuicao",
                "29. Como sua formação contribui",
                100,
            ),
            area(
                "skills",
                "skills_contribuicao",
                "30. Como seu conhecimento (Python/métodos numéricos...) agrega",
                100,
            ),
            text(
                "futuro_ia",
                "futuro_ia",
                "31. Integrar IA/modelagem avançada futuramente? (sim/não + como)",
            ),
        ],
    },
];

/// All fields in header order.
pub fn fields() -> impl Iterator<Item = &'static FieldSpec> {
    SECTIONS.iter().flat_map(|section| section.fields.iter())
}

pub fn field_by_key(key: &str) -> Option<&'static FieldSpec> {
    fields().find(|field| field.key == key)
}

pub fn field_by_column(column: &str) -> Option<&'static FieldSpec> {
    fields().find(|field| field.column == column)
}

/// Sheet header: timestamp, every field column, then the JSON payload column.
pub fn header() -> Vec<&'static str> {
    std::iter::once(TIMESTAMP_COLUMN)
        .chain(fields().map(|field| field.column))
        .chain(std::iter::once(PAYLOAD_COLUMN))
        .collect()
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
