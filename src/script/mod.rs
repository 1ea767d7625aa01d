//! PowerShell source scanning.
//!
//! Scripts are never executed or evaluated. [`reference_extractor`] reads them as
//! text, line by line, and reports every dot-source and module-import directive it
//! finds together with where in the file the path text sits.
//!
//! # Recognized Directives
//!
//! ```powershell
//! . $PSScriptRoot\lib\Config.ps1            # dot-source
//! . "${PSScriptRoot}/lib/My Helpers.ps1"    # quoted, braced anchor
//! Import-Module -Name .\modules\Log.psm1    # module import, named argument
//! Import-Module "$PSScriptRoot\Tools.psd1"  # module import, positional argument
//! using module .\Types.psm1                 # using statement
//! ```
//!
//! Imports of registered module names (`Import-Module Pester`) name no file and
//! are not reported.

pub mod reference_extractor;

pub use reference_extractor::{
    ReferenceKind, ResolutionStatus, SourceReference, expand_anchor, extract_from_path,
    extract_references, is_script_file, strip_leading_anchor,
};
