/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! HDF5 container backend

use super::errors::{Result, S2eError};
use super::tree::{AttrValue, Dataset, DatasetValue, Group, Node};
use hdf5::types::{TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{File, Location};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Write `root` as a new HDF5 file at `path`
pub fn write(path: &Path, root: &Group) -> Result<()> {
    let file = File::create(path)?;
    write_group(&file, root)?;
    file.close()?;
    Ok(())
}

/// Read the full HDF5 file at `path`; external links are followed
pub fn read(path: &Path) -> Result<Group> {
    let file = File::open(path)?;
    read_group(&file)
}

fn to_var_len_unicode(text: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(text)
        .map_err(|e| S2eError::Layout(format!("cannot store string {:?}: {}", text, e)))
}

fn write_attrs(location: &Location, attrs: &BTreeMap<String, AttrValue>) -> Result<()> {
    for (name, value) in attrs {
        match value {
            AttrValue::Float(v) => location.new_attr::<f64>().create(name.as_str())?.write_scalar(v)?,
            AttrValue::Int(v) => location.new_attr::<i64>().create(name.as_str())?.write_scalar(v)?,
            AttrValue::Text(v) => location
                .new_attr::<VarLenUnicode>()
                .create(name.as_str())?
                .write_scalar(&to_var_len_unicode(v)?)?,
        }
    }
    Ok(())
}

fn write_group(h5: &hdf5::Group, group: &Group) -> Result<()> {
    write_attrs(h5, &group.attrs)?;
    for (name, node) in group.members() {
        match node {
            Node::Group(child) => {
                let h5_child = h5.create_group(name)?;
                write_group(&h5_child, child)?;
            }
            Node::Dataset(dataset) => write_dataset(h5, name, dataset)?,
            Node::ExternalLink(link) => {
                h5.link_external(&link.file.to_string_lossy(), &link.path, name)?
            }
        }
    }
    Ok(())
}

fn write_dataset(h5: &hdf5::Group, name: &str, dataset: &Dataset) -> Result<()> {
    let created = match &dataset.value {
        DatasetValue::Float(array) if array.ndim() == 0 => {
            let ds = h5.new_dataset::<f64>().shape(()).create(name)?;
            ds.write_scalar(&array.iter().copied().next().unwrap_or_default())?;
            ds
        }
        DatasetValue::Int(array) if array.ndim() == 0 => {
            let ds = h5.new_dataset::<i64>().shape(()).create(name)?;
            ds.write_scalar(&array.iter().copied().next().unwrap_or_default())?;
            ds
        }
        DatasetValue::Float(array) => h5.new_dataset_builder().with_data(array.view()).create(name)?,
        DatasetValue::Int(array) => h5.new_dataset_builder().with_data(array.view()).create(name)?,
        DatasetValue::Text(text) => {
            let ds = h5.new_dataset::<VarLenUnicode>().shape(()).create(name)?;
            ds.write_scalar(&to_var_len_unicode(text)?)?;
            ds
        }
    };
    write_attrs(&created, &dataset.attrs)
}

fn read_attrs(location: &Location) -> Result<BTreeMap<String, AttrValue>> {
    let mut attrs = BTreeMap::new();
    for name in location.attr_names()? {
        let attr = location.attr(&name)?;
        let value = match attr.dtype()?.to_descriptor()? {
            TypeDescriptor::Float(_) => attr.read_scalar::<f64>().map(AttrValue::Float),
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
                attr.read_scalar::<i64>().map(AttrValue::Int)
            }
            TypeDescriptor::VarLenUnicode => attr
                .read_scalar::<VarLenUnicode>()
                .map(|s| AttrValue::Text(s.as_str().to_string())),
            TypeDescriptor::VarLenAscii => attr
                .read_scalar::<VarLenAscii>()
                .map(|s| AttrValue::Text(s.as_str().to_string())),
            other => {
                debug!("Skipping attribute {} of type {:?}", name, other);
                continue;
            }
        };
        match value {
            Ok(value) => {
                attrs.insert(name, value);
            }
            Err(e) => debug!("Skipping non-scalar attribute {}: {}", name, e),
        }
    }
    Ok(attrs)
}

fn read_group(h5: &hdf5::Group) -> Result<Group> {
    let mut group = Group::new();
    group.attrs = read_attrs(h5)?;

    for name in h5.member_names()? {
        if let Ok(child) = h5.group(&name) {
            group.insert(&name, read_group(&child)?)?;
            continue;
        }
        let ds = match h5.dataset(&name) {
            Ok(ds) => ds,
            Err(e) => {
                warn!("Skipping unreadable member {}: {}", name, e);
                continue;
            }
        };
        let value = match ds.dtype()?.to_descriptor()? {
            TypeDescriptor::Float(_) => DatasetValue::Float(ds.read_dyn::<f64>()?),
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
                DatasetValue::Int(ds.read_dyn::<i64>()?)
            }
            TypeDescriptor::VarLenUnicode => {
                DatasetValue::Text(ds.read_scalar::<VarLenUnicode>()?.as_str().to_string())
            }
            TypeDescriptor::VarLenAscii => {
                DatasetValue::Text(ds.read_scalar::<VarLenAscii>()?.as_str().to_string())
            }
            other => {
                warn!("Skipping dataset {} of unsupported type {:?}", name, other);
                continue;
            }
        };
        let attrs = read_attrs(&ds)?;
        group.insert(&name, Dataset { value, attrs })?;
    }
    Ok(group)
}
