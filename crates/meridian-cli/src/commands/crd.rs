//! crd command - print the ClientIntents CRD

use kube::CustomResourceExt;
use meridian_common::crd::ClientIntents;

use crate::Result;

/// Run the crd command
pub fn run() -> Result<()> {
    print!("{}", render()?);
    Ok(())
}

/// ClientIntents CRD as YAML
pub fn render() -> Result<String> {
    Ok(serde_yaml::to_string(&ClientIntents::crd())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_crd() {
        let yaml = render().unwrap();
        assert!(yaml.contains("kind: CustomResourceDefinition"));
        assert!(yaml.contains("name: clientintents.meridian.dev"));
        assert!(yaml.contains("- ci"));
    }
}
