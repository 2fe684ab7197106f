/// This macro defines the pipeline registers of the CPU.
///
/// Each register is a struct of named [`PipeField`]s. The value after `=` is
/// the neutral value a field takes when the register is bubbled, which is
/// also its value before the first cycle.
///
/// The macro also defines `PipeRegs`, holding one instance of each register
/// under its short name.
///
/// [`PipeField`]: crate::framework::PipeField
#[macro_export]
macro_rules! define_stages {
    ($(
        $(#[$att:meta])*
        $stage_name:ident $short_name:ident {
            $($(#[$field_att:meta])* $fname:ident : $ftype:ty = $fdefault:expr),* $(,)?
        }
    )*) => {
        $(
            $(#[$att])*
            #[derive(Debug, Clone, PartialEq, Eq)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize))]
            pub struct $stage_name {
                $($(#[$field_att])* pub $fname: $crate::framework::PipeField<$ftype>, )*
            }

            impl Default for $stage_name {
                fn default() -> Self {
                    Self {
                        $($fname: $crate::framework::PipeField::new($fdefault), )*
                    }
                }
            }

            impl $stage_name {
                /// Apply the control signal to every field of this register.
                pub fn latch(&mut self, ctrl: $crate::framework::Control) {
                    $(self.$fname.latch(ctrl, $fdefault); )*
                }
            }
        )*

        /// All pipeline registers (all stages).
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct PipeRegs {
            $(pub $short_name: $stage_name, )*
        }
    };
}
