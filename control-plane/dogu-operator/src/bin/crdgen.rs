use dogu_operator::crd::dogu::Dogu;
use kube::core::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&Dogu::crd())?;
    println!("{}", yaml);
    Ok(())
}
