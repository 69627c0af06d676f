pub mod dogu;
