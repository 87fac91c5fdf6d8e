use super::*;

#[test]
fn header_matches_the_sheet_layout() {
    let expected = [
        "timestamp",
        "titulo",
        "orientador",
        "area_concentracao",
        "linha_pesquisa",
        "vinculo_projeto_maior",
        "problema",
        "relevancia",
        "foco",
        "foco_outro",
        "delimitacao",
        "tipo_estudo",
        "ensaios",
        "laboratorio",
        "traco_uhpfrc",
        "software",
        "modelo_constitutivo",
        "ml",
        "artigos_base",
        "lacuna",
        "origem_tema",
        "conexao_pesquisas",
        "hipotese",
        "objetivo_geral",
        "objetivos_especificos",
        "etapas",
        "pretende",
        "produtos",
        "contribuicao",
        "duracao_meses",
        "qualificacao_meses",
        "submissao_artigo",
        "viabilidade_orientador",
        "financiamento",
        "parceria",
        "formacao_contribuicao",
        "skills_contribuicao",
        "futuro_ia",
        "payload_json",
    ];
    assert_eq!(header(), expected);
    assert_eq!(header()[0], TIMESTAMP_COLUMN);
    assert_eq!(header()[38], PAYLOAD_COLUMN);
}

#[test]
fn keys_and_columns_are_unique() {
    let mut keys: Vec<_> = fields().map(|field| field.key).collect();
    let mut columns: Vec<_> = fields().map(|field| field.column).collect();
    keys.sort_unstable();
    keys.dedup();
    columns.sort_unstable();
    columns.dedup();
    assert_eq!(keys.len(), 37);
    assert_eq!(columns.len(), 37);
}

#[test]
fn renamed_fields_resolve_both_ways() {
    let field = field_by_key("obj_especificos").expect("field");
    assert_eq!(field.column, "objetivos_especificos");
    assert_eq!(
        field_by_column("viabilidade_orientador").map(|f| f.key),
        Some("conversou")
    );
    assert!(field_by_key("objetivos_especificos").is_none());
}

#[test]
fn only_duration_has_an_explicit_default() {
    let defaults: Vec<_> = fields()
        .filter_map(|field| field.default.map(|value| (field.key, value)))
        .collect();
    assert_eq!(defaults, vec![("duracao", "24")]);
}

#[test]
fn subheadings_mark_experimental_and_numeric_parts() {
    assert_eq!(
        field_by_key("ensaios").and_then(|f| f.subheading),
        Some("Parte experimental")
    );
    assert_eq!(
        field_by_key("software").and_then(|f| f.subheading),
        Some("Parte numérica")
    );
}
