pub mod catalog;

use books_kernel::ModuleRegistry;

use catalog::Catalog;

/// Register every catalog module, referenced tables first.
pub fn register_all(registry: &mut ModuleRegistry, catalog: &Catalog) {
    for module in catalog::create_modules(catalog) {
        registry.register(module);
    }
}
