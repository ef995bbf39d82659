use portico_core::domain::catalog::{CatalogKind, ProductLine};

/// Logical-to-physical table mapping. Catalog and configuration tables are
/// physically prefixed per product line, so every query site resolves its
/// table name through here instead of concatenating strings.
pub fn catalog_table(product_line: ProductLine, kind: CatalogKind) -> &'static str {
    match (product_line, kind) {
        (ProductLine::Steel, CatalogKind::Model) => "steel_models",
        (ProductLine::Steel, CatalogKind::Color) => "steel_colors",
        (ProductLine::Steel, CatalogKind::Coverage) => "steel_coverage_types",
        (ProductLine::Steel, CatalogKind::Surface) => "steel_surfaces",
        (ProductLine::Steel, CatalogKind::StructureType) => "steel_structure_types",
        (ProductLine::Steel, CatalogKind::Package) => "steel_packages",
        (ProductLine::Wood, CatalogKind::Model) => "wood_models",
        (ProductLine::Wood, CatalogKind::Color) => "wood_colors",
        (ProductLine::Wood, CatalogKind::Coverage) => "wood_coverage_types",
        (ProductLine::Wood, CatalogKind::Surface) => "wood_surfaces",
        (ProductLine::Wood, CatalogKind::StructureType) => "wood_structure_types",
        (ProductLine::Wood, CatalogKind::Package) => "wood_packages",
    }
}

pub fn configuration_table(product_line: ProductLine) -> &'static str {
    match product_line {
        ProductLine::Steel => "steel_configurations",
        ProductLine::Wood => "wood_configurations",
    }
}

#[cfg(test)]
mod tests {
    use portico_core::domain::catalog::{CatalogKind, ProductLine};

    use super::{catalog_table, configuration_table};

    #[test]
    fn catalog_tables_carry_the_product_line_prefix() {
        assert_eq!(catalog_table(ProductLine::Steel, CatalogKind::Color), "steel_colors");
        assert_eq!(
            catalog_table(ProductLine::Wood, CatalogKind::StructureType),
            "wood_structure_types"
        );
    }

    #[test]
    fn configuration_tables_are_split_per_line() {
        assert_eq!(configuration_table(ProductLine::Steel), "steel_configurations");
        assert_eq!(configuration_table(ProductLine::Wood), "wood_configurations");
    }
}
